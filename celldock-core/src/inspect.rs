//! Inspection verdict vocabulary shared by the brain and the host.

/// Command token the brain sends to request a fresh classification.
pub const INSPECT: &str = "INSPECT";
/// Command token the brain sends while polling for the verdict.
pub const RDY_FOR_RESULT: &str = "RDY_FOR_RESULT";

/// Outcome of one inspection round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectionResult {
    Clean,
    Dirty,
    /// The brain's polling deadline elapsed with no verdict. Never crosses
    /// the wire.
    Timeout,
    Error,
}

impl InspectionResult {
    /// Wire token, as carried in a Command frame from the host.
    pub fn token(self) -> &'static str {
        match self {
            InspectionResult::Clean => "CLEAN",
            InspectionResult::Dirty => "DIRTY",
            InspectionResult::Timeout => "TIMEOUT",
            InspectionResult::Error => "ERROR",
        }
    }

    /// Parse a host verdict. Anything unrecognized is an error verdict.
    pub fn from_token(token: &str) -> Self {
        match token {
            "CLEAN" => InspectionResult::Clean,
            "DIRTY" => InspectionResult::Dirty,
            _ => InspectionResult::Error,
        }
    }

    /// Only a dirty verdict sends the battery to recycling; a timed-out or
    /// failed inspection degrades to the acceptable branch by policy.
    pub fn is_acceptable(self) -> bool {
        !matches!(self, InspectionResult::Dirty)
    }
}
