//! Inspection service: the bridge between the hub's result-exchange
//! handshake and the vision collaborators.
//!
//! The capture source, the classifier, and the presentation layer are
//! external. What lives here is the shared cells, the scheduling, and the
//! verdict policy: the latest-frame cell and the pending-verdict cell each
//! sit behind their own mutex, writers hold a lock only for the swap, and
//! readers take snapshots rather than holding a lock across processing.

use std::sync::{Arc, Mutex};

use celldock_core::{InspectionResult, StorageRack};

/// Default confidence above which a detection marks the battery dirty.
pub const DIRTY_CONFIDENCE: f32 = 0.7;

/// One captured camera frame, as the capture collaborator delivers it.
#[derive(Debug, Clone)]
pub struct ImageFrame {
    pub width: u32,
    pub height: u32,
    /// Packed pixel data; the layout is whatever the classifier expects.
    pub data: Vec<u8>,
}

/// One detection out of the classifier.
#[derive(Debug, Clone)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, thiserror::Error)]
#[error("classification failed: {0}")]
pub struct ClassifyError(pub String);

/// Vision model collaborator. Runs on a blocking context; may be slow.
pub trait Classifier: Send + Sync {
    fn classify(&self, frame: &ImageFrame) -> Result<Vec<Detection>, ClassifyError>;
}

/// Receives pushed rack snapshots; issues nothing back into the core.
pub trait PresentationSink: Send + Sync {
    fn push(&self, rack: &StorageRack);
}

/// Latest-frame cell, written by the capture collaborator at its own rate.
#[derive(Default)]
pub struct FrameCell(Mutex<Option<ImageFrame>>);

impl FrameCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, frame: ImageFrame) {
        if let Ok(mut cell) = self.0.lock() {
            *cell = Some(frame);
        }
    }

    pub fn snapshot(&self) -> Option<ImageFrame> {
        self.0.lock().ok().and_then(|cell| cell.clone())
    }
}

/// Owns the pending-verdict cell and schedules classification runs.
pub struct InspectionService {
    frame: Arc<FrameCell>,
    classifier: Option<Arc<dyn Classifier>>,
    verdict: Mutex<Option<InspectionResult>>,
    dirty_confidence: f32,
}

impl InspectionService {
    pub fn new(
        frame: Arc<FrameCell>,
        classifier: Option<Arc<dyn Classifier>>,
        dirty_confidence: f32,
    ) -> Self {
        Self {
            frame,
            classifier,
            verdict: Mutex::new(None),
            dirty_confidence,
        }
    }

    /// `INSPECT`: drop any stale verdict and schedule a fresh
    /// classification off the link-servicing context. Never blocks.
    ///
    /// With no classifier loaded or no frame captured yet there is nothing
    /// to schedule; the hub's poll will time out and degrade to the
    /// acceptable branch.
    pub fn begin(self: &Arc<Self>) {
        if let Ok(mut verdict) = self.verdict.lock() {
            *verdict = None;
        }
        let Some(classifier) = self.classifier.clone() else {
            tracing::warn!("no classifier loaded, inspection will go unanswered");
            return;
        };
        let Some(frame) = self.frame.snapshot() else {
            tracing::warn!("no frame captured yet, inspection will go unanswered");
            return;
        };
        let service = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let verdict = service.evaluate(classifier.as_ref(), &frame);
            tracing::info!(verdict = verdict.token(), "classification done, awaiting hub poll");
            if let Ok(mut cell) = service.verdict.lock() {
                *cell = Some(verdict);
            }
        });
    }

    fn evaluate(&self, classifier: &dyn Classifier, frame: &ImageFrame) -> InspectionResult {
        match classifier.classify(frame) {
            Ok(detections) => {
                for det in &detections {
                    if det.confidence > self.dirty_confidence {
                        tracing::info!(
                            label = %det.label,
                            confidence = f64::from(det.confidence),
                            "high-confidence detection"
                        );
                        return InspectionResult::Dirty;
                    }
                }
                InspectionResult::Clean
            }
            Err(err) => {
                tracing::warn!("classifier failed: {err}");
                InspectionResult::Error
            }
        }
    }

    /// `RDY_FOR_RESULT`: hand over the verdict at most once. A second poll
    /// before a new verdict is ready gets nothing.
    pub fn take_verdict(&self) -> Option<InspectionResult> {
        self.verdict.lock().ok().and_then(|mut cell| cell.take())
    }
}
