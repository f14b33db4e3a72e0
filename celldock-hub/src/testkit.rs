//! Simulated hardware for the loop tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use celldock_core::frame::FrameKind;
use celldock_core::inspect;
use celldock_core::{fragment_advertisements, HubCommand, SlotColor, StorageRack};

use crate::motor::{ColorSensor, Motor};
use crate::port::HostPort;
use crate::radio::{Radio, CAR_CHANNEL, STORAGE_CHANNEL};

/// Instant motor: moves land immediately, stall seeks jump to the stops.
pub struct SimMotor {
    angle: i32,
    pub last_speed: f32,
    pub duty: i8,
    pub running: bool,
    stop_low: i32,
    stop_high: i32,
}

impl SimMotor {
    pub fn new() -> Self {
        Self::with_stops(-1000, 1000)
    }

    pub fn with_stops(low: i32, high: i32) -> Self {
        Self {
            angle: 0,
            last_speed: 0.0,
            duty: 0,
            running: false,
            stop_low: low,
            stop_high: high,
        }
    }
}

impl Motor for SimMotor {
    fn angle(&self) -> i32 {
        self.angle
    }

    fn reset_angle(&mut self, angle: i32) {
        self.angle = angle;
    }

    fn run_target(&mut self, speed: f32, target: i32) {
        self.last_speed = speed;
        self.angle = target;
    }

    fn start_run_target(&mut self, speed: f32, target: i32) {
        self.last_speed = speed;
        self.angle = target;
    }

    fn done(&self) -> bool {
        true
    }

    fn run_until_stalled(&mut self, speed: f32, _duty_limit: u8) -> i32 {
        self.angle = if speed >= 0.0 {
            self.stop_high
        } else {
            self.stop_low
        };
        self.angle
    }

    fn run(&mut self, speed: f32) {
        self.last_speed = speed;
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn dc(&mut self, duty: i8) {
        self.duty = duty;
    }
}

/// Radio with per-channel observation scripts. When a script runs out,
/// its last value stays advertised, matching broadcast semantics. The
/// handle is cloneable so tests can keep inspecting a radio they handed
/// to a hub.
#[derive(Default)]
pub struct ScriptedRadioInner {
    pub broadcasts: Vec<Option<String>>,
    scripts: HashMap<u8, VecDeque<Option<String>>>,
}

#[derive(Clone, Default)]
pub struct ScriptedRadio(Arc<Mutex<ScriptedRadioInner>>);

impl ScriptedRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, ScriptedRadioInner> {
        self.0.lock().unwrap()
    }

    pub fn script<I, S>(&mut self, channel: u8, values: I)
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        self.lock().scripts.insert(
            channel,
            values.into_iter().map(|v| v.map(Into::into)).collect(),
        );
    }
}

impl Radio for ScriptedRadio {
    fn broadcast(&mut self, value: Option<&str>) {
        self.lock().broadcasts.push(value.map(str::to_owned));
    }

    fn observe(&mut self, channel: u8) -> Option<String> {
        let mut inner = self.lock();
        let script = inner.scripts.get_mut(&channel)?;
        if script.len() > 1 {
            script.pop_front().flatten()
        } else {
            script.front().cloned().flatten()
        }
    }
}

/// Emulated car and storage peers for brain tests: every request completes
/// on the first poll, `STORAGE_DATA` streams the rack chunks, and the rack
/// mutates the way the real storage hub would.
pub struct PeerRigInner {
    pub broadcasts: Vec<Option<String>>,
    pub rack: StorageRack,
    current: Option<String>,
    chunks: VecDeque<String>,
}

#[derive(Clone)]
pub struct SharedPeers(Arc<Mutex<PeerRigInner>>);

impl SharedPeers {
    pub fn lock(&self) -> MutexGuard<'_, PeerRigInner> {
        self.0.lock().unwrap()
    }
}

pub struct PeerRig;

impl PeerRig {
    pub fn shared() -> SharedPeers {
        SharedPeers(Arc::new(Mutex::new(PeerRigInner {
            broadcasts: Vec::new(),
            rack: StorageRack::new(),
            current: None,
            chunks: VecDeque::new(),
        })))
    }
}

impl Radio for SharedPeers {
    fn broadcast(&mut self, value: Option<&str>) {
        let mut rig = self.lock();
        rig.broadcasts.push(value.map(str::to_owned));
        rig.current = value.map(str::to_owned);
        if let Some(command) = value.and_then(HubCommand::from_token) {
            match command {
                HubCommand::StorageData => {
                    let json = rig.rack.to_json().unwrap();
                    rig.chunks = fragment_advertisements(&json).into();
                }
                HubCommand::BatteryStorage => {
                    rig.rack.find_empty();
                }
                HubCommand::BatteryReplace => {
                    rig.rack.find_usable();
                }
                HubCommand::BatteryConvertReset => rig.rack.reset(),
                _ => {}
            }
        }
    }

    fn observe(&mut self, channel: u8) -> Option<String> {
        let mut rig = self.lock();
        let current = rig.current.clone()?;
        let command = HubCommand::from_token(&current)?;
        if command == HubCommand::StorageData {
            return rig.chunks.pop_front();
        }
        let peer = match command {
            HubCommand::CarGrab | HubCommand::CarDrop => CAR_CHANNEL,
            _ => STORAGE_CHANNEL,
        };
        if channel != peer {
            return None;
        }
        command.completion().map(str::to_owned)
    }
}

/// Host port that records sends and answers `RDY_FOR_RESULT` with a fixed
/// verdict (or with silence).
pub struct ScriptPortInner {
    pub sent: Vec<(FrameKind, Vec<u8>)>,
    verdict: Option<String>,
    pending: Option<String>,
}

#[derive(Clone)]
pub struct SharedPort(Arc<Mutex<ScriptPortInner>>);

impl SharedPort {
    pub fn lock(&self) -> MutexGuard<'_, ScriptPortInner> {
        self.0.lock().unwrap()
    }
}

pub struct ScriptPort;

impl ScriptPort {
    pub fn shared(verdict: Option<&str>) -> SharedPort {
        SharedPort(Arc::new(Mutex::new(ScriptPortInner {
            sent: Vec::new(),
            verdict: verdict.map(str::to_owned),
            pending: None,
        })))
    }
}

impl HostPort for SharedPort {
    fn send(&mut self, kind: FrameKind, payload: &[u8]) {
        let mut port = self.lock();
        port.sent.push((kind, payload.to_vec()));
        if kind == FrameKind::Command && payload == inspect::RDY_FOR_RESULT.as_bytes() {
            port.pending = port.verdict.clone();
        }
    }

    fn poll_response(&mut self, wait: Duration) -> Option<String> {
        let response = self.lock().pending.take();
        if response.is_none() {
            std::thread::sleep(wait);
        }
        response
    }
}

/// Color sensor fed from a script; the last value repeats.
pub struct ScriptedSensor {
    script: VecDeque<Option<SlotColor>>,
}

impl ScriptedSensor {
    pub fn new<I: IntoIterator<Item = Option<SlotColor>>>(values: I) -> Self {
        Self {
            script: values.into_iter().collect(),
        }
    }
}

impl ColorSensor for ScriptedSensor {
    fn color(&mut self) -> Option<SlotColor> {
        if self.script.len() > 1 {
            self.script.pop_front().flatten()
        } else {
            self.script.front().cloned().flatten()
        }
    }
}
