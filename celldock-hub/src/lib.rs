//! CellDock control-unit loops.
//!
//! Each hub is an independently powered unit running a single cooperative
//! loop; suspension happens only at explicit fixed-duration waits, so every
//! cadence here is best-effort, not a hard deadline. Hardware (radio,
//! motors, color sensor, the host link) sits behind traits; firmware
//! targets supply the implementations and tests supply mocks.

pub mod brain;
pub mod car;
pub mod motor;
pub mod port;
pub mod radio;
pub mod storage_hub;

#[cfg(test)]
pub(crate) mod testkit;

pub use brain::{ArmGeometry, Axis, Brain, BrainError, BrainHardware, RigTiming, Stage};
pub use car::CarHub;
pub use motor::{ColorSensor, Motor};
pub use port::HostPort;
pub use radio::{ProtocolTiming, Radio, BRAIN_CHANNEL, CAR_CHANNEL, STORAGE_CHANNEL};
pub use storage_hub::StorageHub;
