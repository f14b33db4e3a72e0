//! Inter-hub command vocabulary and the value-change dedup rule.

/// Commands one hub advertises on its broadcast channel to request an
/// action from a peer. Token spellings are the wire protocol, verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubCommand {
    BatteryStorage,
    BatteryReplace,
    StopBatteryTrack,
    StartBatteryTrack,
    BatteryConvertReset,
    StorageData,
    CarGrab,
    CarDrop,
}

impl HubCommand {
    pub const ALL: [HubCommand; 8] = [
        HubCommand::BatteryStorage,
        HubCommand::BatteryReplace,
        HubCommand::StopBatteryTrack,
        HubCommand::StartBatteryTrack,
        HubCommand::BatteryConvertReset,
        HubCommand::StorageData,
        HubCommand::CarGrab,
        HubCommand::CarDrop,
    ];

    /// Token the requester advertises.
    pub fn token(self) -> &'static str {
        match self {
            HubCommand::BatteryStorage => "BATTERY_STORAGE",
            HubCommand::BatteryReplace => "BATTERY_REPLACE",
            HubCommand::StopBatteryTrack => "STOP_BATTERY_TRACK",
            HubCommand::StartBatteryTrack => "START_BATTERY_TRACK",
            HubCommand::BatteryConvertReset => "BATTERY_CONVERT_RESET",
            HubCommand::StorageData => "STORAGE_DATA",
            HubCommand::CarGrab => "CAR_GRAB",
            HubCommand::CarDrop => "CAR_DROP",
        }
    }

    /// Completion token the peer advertises once the action is done.
    /// `StorageData` has none: it is answered through the chunked codec.
    pub fn completion(self) -> Option<&'static str> {
        match self {
            HubCommand::BatteryStorage => Some("BATTERY_STORAGED"),
            HubCommand::BatteryReplace => Some("BATTERY_REPLACED"),
            HubCommand::StopBatteryTrack => Some("STOPED_BATTERY_TRACK"),
            HubCommand::StartBatteryTrack => Some("STARTED_BATTERY_TRACK"),
            HubCommand::BatteryConvertReset => Some("BATTERY_CONVERT_RESETED"),
            HubCommand::StorageData => None,
            HubCommand::CarGrab => Some("CAR_GRABED"),
            HubCommand::CarDrop => Some("CAR_DROPPED"),
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.token() == token)
    }
}

/// Value-change detector over a peer's advertised channel.
///
/// A peer polls at a fixed cadence and must handle each advertised command
/// exactly once. Dedup is by value equality across polls, not a sequence
/// counter: a changed value triggers handling, an unchanged one does not.
/// Empty observations are skipped outright and do NOT reset the comparison
/// value, so a token re-advertised after a gap of silence still counts as
/// already handled. This trade-off favors simplicity over replay-safety
/// and is part of the protocol contract.
#[derive(Debug, Default)]
pub struct TokenWatcher {
    last_handled: Option<String>,
}

impl TokenWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one observation; returns the token to handle, at most once per
    /// value change.
    pub fn observe(&mut self, value: Option<&str>) -> Option<String> {
        let value = value?;
        if value.is_empty() {
            return None;
        }
        if self.last_handled.as_deref() == Some(value) {
            return None;
        }
        self.last_handled = Some(value.to_owned());
        Some(value.to_owned())
    }
}
