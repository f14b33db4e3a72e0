//! Broadcast radio seam and the request/observe choreography primitives.

use std::time::{Duration, Instant};

use celldock_core::chunk::{self, ChunkAssembler, ChunkProgress};
use celldock_core::{fragment_advertisements, HubCommand, StorageRack};

/// Brain hub broadcast channel.
pub const BRAIN_CHANNEL: u8 = 179;
/// Transport car broadcast channel.
pub const CAR_CHANNEL: u8 = 198;
/// Storage carousel broadcast channel.
pub const STORAGE_CHANNEL: u8 = 147;

/// Last-value-wins advertisement link. `broadcast(None)` clears this hub's
/// own channel; `observe` reads whatever a peer currently advertises. It
/// is not a queued receive.
pub trait Radio {
    fn broadcast(&mut self, value: Option<&str>);
    fn observe(&mut self, channel: u8) -> Option<String>;
}

/// Cadence and deadline knobs for the choreography loops. Defaults are the
/// protocol constants; tests compress them.
#[derive(Debug, Clone)]
pub struct ProtocolTiming {
    /// Peer-channel poll cadence while waiting for a completion token.
    pub command_poll: Duration,
    /// Dwell between chunked advertisements.
    pub chunk_gap: Duration,
    /// Reassembly deadline for a chunked response.
    pub chunk_timeout: Duration,
    /// Inner poll step while reassembling or reading the host port.
    pub observe_poll: Duration,
    /// Interval between `RDY_FOR_RESULT` sends.
    pub result_poll: Duration,
    /// Total wait for an inspection verdict.
    pub result_timeout: Duration,
}

impl Default for ProtocolTiming {
    fn default() -> Self {
        Self {
            command_poll: Duration::from_millis(100),
            chunk_gap: chunk::CHUNK_GAP,
            chunk_timeout: chunk::REASSEMBLY_TIMEOUT,
            observe_poll: Duration::from_millis(10),
            result_poll: Duration::from_millis(250),
            result_timeout: Duration::from_millis(10_000),
        }
    }
}

/// Advertise `command` on our own channel and poll `peer_channel` until the
/// matching completion token appears, then clear our channel.
///
/// There is deliberately no timeout: a crashed peer or a missed broadcast
/// stalls the requester forever. That liveness risk is accepted for the
/// physical rig rather than papered over with an invented recovery policy.
pub fn request(
    radio: &mut dyn Radio,
    peer_channel: u8,
    command: HubCommand,
    timing: &ProtocolTiming,
) {
    let Some(completion) = command.completion() else {
        // STORAGE_DATA is answered through the chunked codec; see
        // `request_storage_data`.
        return;
    };
    tracing::debug!(token = command.token(), "requesting");
    radio.broadcast(Some(command.token()));
    loop {
        if radio.observe(peer_channel).as_deref() == Some(completion) {
            radio.broadcast(None);
            tracing::debug!(token = completion, "acknowledged");
            return;
        }
        std::thread::sleep(timing.command_poll);
    }
}

/// Advertise `STORAGE_DATA` and reassemble the chunked reply from
/// `peer_channel`. Returns `None` if the reply does not complete within the
/// reassembly deadline; either way our own channel is cleared on the way
/// out.
pub fn request_storage_data(
    radio: &mut dyn Radio,
    peer_channel: u8,
    timing: &ProtocolTiming,
) -> Option<StorageRack> {
    radio.broadcast(Some(HubCommand::StorageData.token()));
    let mut assembler = ChunkAssembler::new();
    let deadline = Instant::now() + timing.chunk_timeout;
    while Instant::now() < deadline {
        if let Some(value) = radio.observe(peer_channel) {
            if let ChunkProgress::Complete(text) = assembler.observe(&value) {
                radio.broadcast(None);
                return match StorageRack::from_json(&text) {
                    Ok(rack) => Some(rack),
                    Err(err) => {
                        tracing::warn!("discarding unparseable rack snapshot: {err}");
                        None
                    }
                };
            }
        }
        std::thread::sleep(timing.observe_poll);
    }
    tracing::warn!("rack snapshot reassembly timed out");
    radio.broadcast(None);
    None
}

/// Broadcast `text` through the chunked codec: dwell on each fragment,
/// then clear the channel as the completion boundary.
pub fn broadcast_chunked(radio: &mut dyn Radio, text: &str, timing: &ProtocolTiming) {
    for advertisement in fragment_advertisements(text) {
        radio.broadcast(Some(&advertisement));
        std::thread::sleep(timing.chunk_gap);
    }
    radio.broadcast(None);
}
