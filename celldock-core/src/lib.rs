//! CellDock coordination protocol.
//! Sans-I/O: hubs and the host daemon drive these types; no sockets,
//! threads, or clocks in here.

pub mod chunk;
pub mod command;
pub mod frame;
pub mod inspect;
pub mod motion;
pub mod storage;

pub use chunk::{fragment_advertisements, ChunkAssembler, ChunkProgress};
pub use command::{HubCommand, TokenWatcher};
pub use frame::{encode_frame, FrameDecoder, FrameEncodeError, FrameKind, RawFrame};
pub use inspect::InspectionResult;
pub use motion::synchronized_speeds;
pub use storage::{Slot, SlotColor, StorageRack};
