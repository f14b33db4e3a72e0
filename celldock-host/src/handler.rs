//! Protocol dispatch for frames decoded off the hub link.

use std::sync::{Arc, Mutex};

use celldock_core::frame::{FrameDecoder, FrameKind, RawFrame};
use celldock_core::inspect::{INSPECT, RDY_FOR_RESULT};
use celldock_core::{encode_frame, StorageRack};
use tokio::sync::mpsc;

use crate::vision::{InspectionService, PresentationSink};

/// Owns the frame accumulator, the host's read-only rack snapshot, and the
/// path back to the hub. `on_bytes` runs on the link notification path and
/// must not block: it appends to the accumulator, drains complete frames,
/// and dispatches them; the only locks taken are held for a copy/replace.
pub struct ProtocolHandler {
    decoder: Mutex<FrameDecoder>,
    storage: Mutex<StorageRack>,
    inspector: Arc<InspectionService>,
    presentation: Box<dyn PresentationSink>,
    to_hub: mpsc::UnboundedSender<Vec<u8>>,
}

impl ProtocolHandler {
    pub fn new(
        inspector: Arc<InspectionService>,
        presentation: Box<dyn PresentationSink>,
        to_hub: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Self {
        Self {
            decoder: Mutex::new(FrameDecoder::new()),
            // The cache boots with the same defaults as the hub rack and is
            // refreshed whenever a Storage frame lands.
            storage: Mutex::new(StorageRack::new()),
            inspector,
            presentation,
            to_hub,
        }
    }

    /// Current rack snapshot as last reported by the brain.
    pub fn storage_snapshot(&self) -> StorageRack {
        self.storage
            .lock()
            .map(|rack| rack.clone())
            .unwrap_or_default()
    }

    /// Feed raw link bytes and dispatch every frame they complete.
    pub fn on_bytes(&self, bytes: &[u8]) {
        let frames = match self.decoder.lock() {
            Ok(mut decoder) => decoder.drain(bytes),
            Err(_) => return,
        };
        for frame in frames {
            self.dispatch(frame);
        }
    }

    fn dispatch(&self, frame: RawFrame) {
        match FrameKind::from_byte(frame.kind) {
            Some(FrameKind::Storage) => self.on_storage(&frame.payload),
            Some(FrameKind::Command) => self.on_command(&frame.payload),
            Some(FrameKind::Log) => {
                tracing::info!(target: "celldock::hub", "{}", String::from_utf8_lossy(&frame.payload));
            }
            None => tracing::warn!(kind = frame.kind, "dropping frame of unknown kind"),
        }
    }

    fn on_storage(&self, payload: &[u8]) {
        match StorageRack::decode_payload(payload) {
            Ok(rack) => {
                if let Ok(mut cached) = self.storage.lock() {
                    *cached = rack.clone();
                }
                self.presentation.push(&rack);
            }
            // Malformed snapshot: log and drop, cache unchanged.
            Err(err) => tracing::warn!("dropping storage frame: {err}"),
        }
    }

    fn on_command(&self, payload: &[u8]) {
        let command = String::from_utf8_lossy(payload);
        match command.as_ref() {
            INSPECT => {
                tracing::info!("hub requested an inspection");
                self.inspector.begin();
            }
            RDY_FOR_RESULT => {
                if let Some(verdict) = self.inspector.take_verdict() {
                    tracing::info!(verdict = verdict.token(), "answering hub poll");
                    match encode_frame(FrameKind::Command, verdict.token().as_bytes()) {
                        Ok(frame) => {
                            let _ = self.to_hub.send(frame);
                        }
                        Err(err) => tracing::warn!("verdict frame rejected: {err}"),
                    }
                }
            }
            other => tracing::debug!(command = other, "ignoring unknown command"),
        }
    }
}
