//! Brain hub: the orchestration state machine for the arm rig.
//!
//! One battery pass: home every axis, reset the storage rack, take the
//! spent battery from the car, show it to the host's classifier, then
//! either store it or recycle it and finally hand the car a charged
//! replacement. Stages are plain functions threaded through an explicit
//! context struct; the whole pass aborts on the first calibration
//! violation.

use std::time::{Duration, Instant};

use celldock_core::frame::FrameKind;
use celldock_core::inspect::{self, InspectionResult};
use celldock_core::{HubCommand, StorageRack};

use crate::motor::{move_pair, Motor};
use crate::port::HostPort;
use crate::radio::{
    request, request_storage_data, ProtocolTiming, Radio, CAR_CHANNEL, STORAGE_CHANNEL,
};

/// Nominal single-axis target speed, degrees per second.
const ARM_SPEED: f32 = 360.0;
/// Bed and homing speed.
const FAST_SPEED: f32 = 720.0;
/// Boom homing approach speeds; the boom is re-zeroed through a slow
/// two-sided pass to squeeze out gear backlash.
const BOOM_SEEK_SPEED: f32 = 330.0;
const BOOM_CREEP_SPEED: f32 = 180.0;
const BOOM_BACKLASH: i32 = 30;
/// Stall-seek speed while calibrating the gripper jaws.
const GRIP_CAL_SPEED: f32 = 900.0;
const HOME_DUTY_LIMIT: u8 = 100;
const BOOM_DUTY_LIMIT: u8 = 50;
const SWITCH_CAL_DUTY_LIMIT: u8 = 200;
const SWITCH_DUTY_LIMIT: u8 = 100;

/// Motor axes on the arm rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Lift,
    Gripper,
    Boom,
    Bed,
    Claw,
}

/// Stage of the top-level choreography.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reset,
    ConvertReset,
    Grab,
    Check,
    Store,
    Recycle,
    BasePosition,
    Replace,
}

/// Orchestration failure. A calibration violation is fatal: the sequence
/// aborts rather than moving an axis with no absolute zero.
#[derive(Debug, thiserror::Error)]
pub enum BrainError {
    #[error("{axis:?} axis moved before calibration")]
    Uncalibrated { axis: Axis },
}

/// Named rig positions in degrees. Base angles are absolute (relative to
/// the homed zero); the rest are offsets added to the base. Defaults are
/// this rig's tuning; deployments override what their mechanics need.
#[derive(Debug, Clone)]
pub struct ArmGeometry {
    pub lift_base: i32,
    pub boom_base: i32,
    pub bed_base: i32,
    pub bed_car: i32,
    pub bed_storage: i32,
    pub bed_drop: i32,
    pub lift_temp: i32,
    pub boom_temp: i32,
    pub lift_move: i32,
    pub boom_move: i32,
    pub lift_storage: i32,
    pub boom_storage: i32,
    pub lift_check: i32,
    pub boom_check: i32,
    pub lift_drop: i32,
    pub boom_drop: i32,
    /// Extra boom reach when pulling a replacement out of the rack.
    pub replace_boom_extra: i32,
    /// Base-position scale after a store/recycle pass.
    pub base_scale: f32,
    /// Base-position scales at the end of the replace stage.
    pub replace_lift_scale: f32,
    pub replace_boom_scale: f32,
    /// Feeder belt duty while the pass runs.
    pub feeder_duty: i8,
}

impl Default for ArmGeometry {
    fn default() -> Self {
        Self {
            lift_base: 502,
            boom_base: -624,
            bed_base: 10,
            bed_car: 640,
            bed_storage: 1650,
            bed_drop: 0,
            lift_temp: 320,
            boom_temp: 270,
            lift_move: 250,
            boom_move: -90,
            lift_storage: 250,
            boom_storage: -170,
            lift_check: -330,
            boom_check: 280,
            lift_drop: 410,
            boom_drop: -480,
            replace_boom_extra: 25,
            base_scale: 0.98,
            replace_lift_scale: 1.01,
            replace_boom_scale: 1.07,
            feeder_duty: 100,
        }
    }
}

/// Mechanical dwell times. Tests zero these with [`RigTiming::instant`].
#[derive(Debug, Clone)]
pub struct RigTiming {
    /// Pause between the two stall seeks of a switch calibration.
    pub switch_settle: Duration,
    /// Hold on the stop before a toggled switch re-centers.
    pub grip_hold: Duration,
    pub claw_hold: Duration,
    /// Pause after a switch re-centers.
    pub switch_dwell: Duration,
    /// Generic mid-stage pause.
    pub settle: Duration,
    /// Pause at the end of the reset stage.
    pub reset_settle: Duration,
}

impl Default for RigTiming {
    fn default() -> Self {
        Self {
            switch_settle: Duration::from_millis(100),
            grip_hold: Duration::from_millis(500),
            claw_hold: Duration::from_millis(1000),
            switch_dwell: Duration::from_millis(1000),
            settle: Duration::from_millis(1000),
            reset_settle: Duration::from_millis(3000),
        }
    }
}

impl RigTiming {
    /// All-zero dwells, for simulated rigs.
    pub fn instant() -> Self {
        Self {
            switch_settle: Duration::ZERO,
            grip_hold: Duration::ZERO,
            claw_hold: Duration::ZERO,
            switch_dwell: Duration::ZERO,
            settle: Duration::ZERO,
            reset_settle: Duration::ZERO,
        }
    }
}

/// The physical rig handed to the brain.
pub struct BrainHardware {
    pub radio: Box<dyn Radio>,
    pub port: Box<dyn HostPort>,
    pub lift: Box<dyn Motor>,
    pub gripper: Box<dyn Motor>,
    pub boom: Box<dyn Motor>,
    pub bed: Box<dyn Motor>,
    pub claw: Box<dyn Motor>,
    pub feeder: Box<dyn Motor>,
}

/// A calibrated two-point switch: stall angles found during reset, a
/// mid-point to park at, and the direction the next toggle drives toward.
#[derive(Debug, Clone)]
struct SwitchState {
    mid: i32,
    direction: f32,
}

/// Calibration evidence per position axis, set once during the reset
/// stage and never cleared for the life of the process. The two switches
/// carry theirs inside `Option<SwitchState>`.
#[derive(Debug, Default, Clone)]
struct Calibration {
    lift: bool,
    boom: bool,
    bed: bool,
}

pub struct Brain {
    radio: Box<dyn Radio>,
    port: Box<dyn HostPort>,
    lift: Box<dyn Motor>,
    gripper: Box<dyn Motor>,
    boom: Box<dyn Motor>,
    bed: Box<dyn Motor>,
    claw: Box<dyn Motor>,
    feeder: Box<dyn Motor>,
    geometry: ArmGeometry,
    timing: ProtocolTiming,
    rig: RigTiming,
    calibration: Calibration,
    grip: Option<SwitchState>,
    claw_switch: Option<SwitchState>,
    /// Mirror significant events to the host as Log frames.
    debug: bool,
    rack: Option<StorageRack>,
}

impl Brain {
    pub fn new(
        hardware: BrainHardware,
        geometry: ArmGeometry,
        timing: ProtocolTiming,
        rig: RigTiming,
    ) -> Self {
        Self {
            radio: hardware.radio,
            port: hardware.port,
            lift: hardware.lift,
            gripper: hardware.gripper,
            boom: hardware.boom,
            bed: hardware.bed,
            claw: hardware.claw,
            feeder: hardware.feeder,
            geometry,
            timing,
            rig,
            calibration: Calibration::default(),
            grip: None,
            claw_switch: None,
            debug: true,
            rack: None,
        }
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Latest rack snapshot fetched from the storage hub, if any.
    pub fn rack_snapshot(&self) -> Option<&StorageRack> {
        self.rack.as_ref()
    }

    /// Run one full battery pass.
    pub fn run(&mut self) -> Result<(), BrainError> {
        self.feeder.dc(self.geometry.feeder_duty);
        self.reset()?;
        self.convert_reset();
        self.grab()?;
        self.arm_to_temp()?;
        self.arm_to_move()?;
        let verdict = self.check()?;
        if verdict.is_acceptable() {
            self.store()?;
        } else {
            self.recycle()?;
        }
        self.base_position()?;
        self.replace_battery()?;
        tracing::info!("battery pass complete");
        Ok(())
    }

    // --- stages ---

    fn reset(&mut self) -> Result<(), BrainError> {
        self.enter(Stage::Reset);
        self.home_bed();
        self.bed_to(self.geometry.bed_car)?;
        self.home_lift();
        self.home_boom();
        self.home_gripper();
        self.home_claw();
        std::thread::sleep(self.rig.reset_settle);
        Ok(())
    }

    fn convert_reset(&mut self) {
        self.enter(Stage::ConvertReset);
        request(
            &mut *self.radio,
            STORAGE_CHANNEL,
            HubCommand::BatteryConvertReset,
            &self.timing,
        );
        self.refresh_rack_snapshot();
    }

    fn grab(&mut self) -> Result<(), BrainError> {
        self.enter(Stage::Grab);
        self.toggle_claw()?;
        self.call_car(HubCommand::CarDrop);
        self.toggle_gripper()?;
        std::thread::sleep(self.rig.settle);
        self.toggle_claw()?;
        self.call_car(HubCommand::CarGrab);
        Ok(())
    }

    fn check(&mut self) -> Result<InspectionResult, BrainError> {
        self.enter(Stage::Check);
        self.arm_to_temp()?;
        self.arm_to_check()?;
        self.bed_to(self.geometry.bed_drop)?;
        let verdict = self.wait_for_verdict();
        match verdict {
            InspectionResult::Dirty => self.log_to_host("verdict: dirty, recycling"),
            InspectionResult::Clean => self.log_to_host("verdict: clean"),
            _ => self.log_to_host("verdict: no answer, treating as clean"),
        }
        self.bed_to(self.geometry.bed_car)?;
        self.arm_to_temp()?;
        self.arm_to_move()?;
        Ok(verdict)
    }

    fn store(&mut self) -> Result<(), BrainError> {
        self.enter(Stage::Store);
        request(
            &mut *self.radio,
            STORAGE_CHANNEL,
            HubCommand::BatteryStorage,
            &self.timing,
        );
        self.bed_to(self.geometry.bed_storage)?;
        self.toggle_claw()?;
        self.arm_to_storage()?;
        self.toggle_gripper()?;
        self.toggle_claw()?;
        self.refresh_rack_snapshot();
        Ok(())
    }

    fn recycle(&mut self) -> Result<(), BrainError> {
        self.enter(Stage::Recycle);
        self.bed_to(self.geometry.bed_drop)?;
        request(
            &mut *self.radio,
            STORAGE_CHANNEL,
            HubCommand::StopBatteryTrack,
            &self.timing,
        );
        self.arm_to_drop()?;
        self.toggle_gripper()?;
        self.arm_to_move()?;
        request(
            &mut *self.radio,
            STORAGE_CHANNEL,
            HubCommand::StartBatteryTrack,
            &self.timing,
        );
        Ok(())
    }

    fn base_position(&mut self) -> Result<(), BrainError> {
        self.enter(Stage::BasePosition);
        self.arm_to_move()?;
        self.bed_to(self.geometry.bed_car)?;
        self.arm_to_base(self.geometry.base_scale, self.geometry.base_scale)
    }

    fn replace_battery(&mut self) -> Result<(), BrainError> {
        self.enter(Stage::Replace);
        self.arm_to_move()?;
        request(
            &mut *self.radio,
            STORAGE_CHANNEL,
            HubCommand::BatteryReplace,
            &self.timing,
        );
        self.bed_to(self.geometry.bed_storage)?;
        let reach = self.geometry.boom_storage - self.geometry.replace_boom_extra;
        self.arm_to(self.geometry.lift_storage, reach)?;
        std::thread::sleep(self.rig.settle);
        self.toggle_claw()?;
        self.toggle_gripper()?;
        self.arm_to_move()?;
        self.refresh_rack_snapshot();
        self.toggle_claw()?;
        self.bed_to(self.geometry.bed_car)?;
        self.arm_to_temp()?;
        self.arm_to_base(
            self.geometry.replace_lift_scale,
            self.geometry.replace_boom_scale,
        )?;
        self.call_car(HubCommand::CarDrop);
        self.toggle_claw()?;
        self.call_car(HubCommand::CarGrab);
        self.toggle_gripper()?;
        self.toggle_claw()
    }

    // --- result-exchange handshake ---

    /// Ask the host for a fresh classification and poll for the verdict:
    /// one `INSPECT`, then `RDY_FOR_RESULT` every result-poll interval
    /// until the deadline. The first non-empty decoded response wins.
    fn wait_for_verdict(&mut self) -> InspectionResult {
        self.port.send(FrameKind::Command, inspect::INSPECT.as_bytes());
        self.log_to_host("inspection requested, polling for verdict");
        let deadline = Instant::now() + self.timing.result_timeout;
        while Instant::now() < deadline {
            self.port
                .send(FrameKind::Command, inspect::RDY_FOR_RESULT.as_bytes());
            let window = Instant::now() + self.timing.result_poll;
            while Instant::now() < window {
                if let Some(line) = self.port.poll_response(self.timing.observe_poll) {
                    let line = line.trim();
                    if !line.is_empty() {
                        return InspectionResult::from_token(line);
                    }
                }
            }
        }
        self.log_to_host("verdict wait timed out");
        InspectionResult::Timeout
    }

    // --- choreography helpers ---

    fn call_car(&mut self, command: HubCommand) {
        request(&mut *self.radio, CAR_CHANNEL, command, &self.timing);
    }

    /// Pull the rack snapshot from the storage hub and forward it to the
    /// host as a Storage frame. A reassembly timeout leaves the previous
    /// snapshot in place.
    fn refresh_rack_snapshot(&mut self) {
        if let Some(rack) = request_storage_data(&mut *self.radio, STORAGE_CHANNEL, &self.timing) {
            self.port.send(FrameKind::Storage, &rack.encode_payload());
            if let Ok(json) = rack.to_json() {
                self.log_to_host(&format!("rack snapshot: {json}"));
            }
            self.rack = Some(rack);
        }
    }

    fn enter(&mut self, stage: Stage) {
        tracing::info!(?stage, "entering stage");
        self.log_to_host(&format!("stage: {stage:?}"));
    }

    fn log_to_host(&mut self, message: &str) {
        tracing::debug!("{message}");
        if self.debug {
            self.port.send(FrameKind::Log, message.as_bytes());
        }
    }

    // --- homing ---

    fn home_lift(&mut self) {
        self.lift.run_until_stalled(-FAST_SPEED, HOME_DUTY_LIMIT);
        self.lift.reset_angle(0);
        self.lift.run_target(FAST_SPEED, self.geometry.lift_base);
        self.calibration.lift = true;
    }

    fn home_boom(&mut self) {
        let base = self.geometry.boom_base;
        self.boom.run_until_stalled(BOOM_SEEK_SPEED, BOOM_DUTY_LIMIT);
        self.boom.reset_angle(0);
        self.boom.run_target(BOOM_SEEK_SPEED, base - BOOM_BACKLASH);
        self.boom.run_target(BOOM_CREEP_SPEED, base + BOOM_BACKLASH);
        self.boom.reset_angle(base);
        self.calibration.boom = true;
    }

    fn home_bed(&mut self) {
        self.bed.run_until_stalled(-FAST_SPEED, HOME_DUTY_LIMIT);
        self.bed.reset_angle(0);
        self.bed.run_target(FAST_SPEED, self.geometry.bed_base);
        self.calibration.bed = true;
    }

    fn home_gripper(&mut self) {
        let (open, close) = calibrate_switch(
            &mut *self.gripper,
            GRIP_CAL_SPEED,
            self.rig.switch_settle,
        );
        let mid = (open + close) / 2;
        self.gripper.run_target(FAST_SPEED, mid);
        self.grip = Some(SwitchState { mid, direction: 1.0 });
    }

    fn home_claw(&mut self) {
        let (open, close) =
            calibrate_switch(&mut *self.claw, -FAST_SPEED, self.rig.switch_settle);
        let mid = (open + close) / 2;
        self.claw.run_target(FAST_SPEED, mid);
        self.claw_switch = Some(SwitchState { mid, direction: -1.0 });
    }

    // --- position-dependent moves (calibration-gated) ---

    fn require_arm(&self) -> Result<(), BrainError> {
        if !self.calibration.lift {
            return Err(BrainError::Uncalibrated { axis: Axis::Lift });
        }
        if !self.calibration.boom {
            return Err(BrainError::Uncalibrated { axis: Axis::Boom });
        }
        Ok(())
    }

    fn arm_to(&mut self, lift_offset: i32, boom_offset: i32) -> Result<(), BrainError> {
        self.require_arm()?;
        move_pair(
            &mut *self.lift,
            self.geometry.lift_base + lift_offset,
            &mut *self.boom,
            self.geometry.boom_base + boom_offset,
        );
        Ok(())
    }

    fn arm_to_temp(&mut self) -> Result<(), BrainError> {
        self.arm_to(self.geometry.lift_temp, self.geometry.boom_temp)
    }

    fn arm_to_move(&mut self) -> Result<(), BrainError> {
        self.arm_to(self.geometry.lift_move, self.geometry.boom_move)
    }

    fn arm_to_storage(&mut self) -> Result<(), BrainError> {
        self.arm_to(self.geometry.lift_storage, self.geometry.boom_storage)
    }

    fn arm_to_drop(&mut self) -> Result<(), BrainError> {
        self.arm_to(self.geometry.lift_drop, self.geometry.boom_drop)
    }

    /// The camera approach runs the axes one after the other; the pose is
    /// tight enough that a paired sweep could clip the bed.
    fn arm_to_check(&mut self) -> Result<(), BrainError> {
        self.require_arm()?;
        self.lift
            .run_target(ARM_SPEED, self.geometry.lift_base + self.geometry.lift_check);
        self.boom
            .run_target(ARM_SPEED, self.geometry.boom_base + self.geometry.boom_check);
        Ok(())
    }

    /// Return to base and re-declare the base angles, absorbing drift
    /// accumulated over the pass.
    fn arm_to_base(&mut self, lift_scale: f32, boom_scale: f32) -> Result<(), BrainError> {
        self.require_arm()?;
        let lift_target = (self.geometry.lift_base as f32 * lift_scale) as i32;
        let boom_target = (self.geometry.boom_base as f32 * boom_scale) as i32;
        move_pair(&mut *self.lift, lift_target, &mut *self.boom, boom_target);
        self.lift.reset_angle(self.geometry.lift_base);
        self.boom.reset_angle(self.geometry.boom_base);
        Ok(())
    }

    fn bed_to(&mut self, target: i32) -> Result<(), BrainError> {
        if !self.calibration.bed {
            return Err(BrainError::Uncalibrated { axis: Axis::Bed });
        }
        self.bed.run_target(FAST_SPEED, target);
        Ok(())
    }

    fn toggle_gripper(&mut self) -> Result<(), BrainError> {
        let Some(state) = self.grip.as_mut() else {
            return Err(BrainError::Uncalibrated { axis: Axis::Gripper });
        };
        toggle_switch(
            &mut *self.gripper,
            state,
            self.rig.grip_hold,
            self.rig.switch_dwell,
        );
        Ok(())
    }

    fn toggle_claw(&mut self) -> Result<(), BrainError> {
        let Some(state) = self.claw_switch.as_mut() else {
            return Err(BrainError::Uncalibrated { axis: Axis::Claw });
        };
        toggle_switch(
            &mut *self.claw,
            state,
            self.rig.claw_hold,
            self.rig.switch_dwell,
        );
        Ok(())
    }
}

/// Find a switch's two stall stops. Returns `(low, high)` angles.
fn calibrate_switch(motor: &mut dyn Motor, seek_speed: f32, settle: Duration) -> (i32, i32) {
    let a = motor.run_until_stalled(seek_speed, SWITCH_CAL_DUTY_LIMIT);
    std::thread::sleep(settle);
    let b = motor.run_until_stalled(-seek_speed, SWITCH_CAL_DUTY_LIMIT);
    std::thread::sleep(settle);
    (a.min(b), a.max(b))
}

/// Drive the switch onto its next stop, hold, then park at the mid-point.
fn toggle_switch(motor: &mut dyn Motor, state: &mut SwitchState, hold: Duration, dwell: Duration) {
    motor.run_until_stalled(state.direction * FAST_SPEED, SWITCH_DUTY_LIMIT);
    std::thread::sleep(hold);
    motor.run_target(FAST_SPEED, state.mid);
    std::thread::sleep(dwell);
    state.direction = -state.direction;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{PeerRig, ScriptPort, SharedPeers, SharedPort, SimMotor};

    fn fast_timing() -> ProtocolTiming {
        ProtocolTiming {
            command_poll: Duration::from_millis(1),
            chunk_gap: Duration::from_millis(1),
            chunk_timeout: Duration::from_millis(100),
            observe_poll: Duration::from_millis(1),
            result_poll: Duration::from_millis(2),
            result_timeout: Duration::from_millis(20),
        }
    }

    fn sim_brain(verdict: Option<&str>) -> (Brain, SharedPeers, SharedPort) {
        let peers = PeerRig::shared();
        let port = ScriptPort::shared(verdict);
        let hardware = BrainHardware {
            radio: Box::new(peers.clone()),
            port: Box::new(port.clone()),
            lift: Box::new(SimMotor::new()),
            gripper: Box::new(SimMotor::with_stops(-40, 40)),
            boom: Box::new(SimMotor::new()),
            bed: Box::new(SimMotor::new()),
            claw: Box::new(SimMotor::with_stops(-60, 60)),
            feeder: Box::new(SimMotor::new()),
        };
        let brain = Brain::new(
            hardware,
            ArmGeometry::default(),
            fast_timing(),
            RigTiming::instant(),
        );
        (brain, peers, port)
    }

    fn commands_sent(peers: &SharedPeers) -> Vec<String> {
        peers
            .lock()
            .broadcasts
            .iter()
            .flatten()
            .filter(|v| !v.starts_with("D:"))
            .cloned()
            .collect()
    }

    #[test]
    fn clean_pass_stores_and_replaces() {
        let (mut brain, peers, port) = sim_brain(Some("CLEAN"));
        brain.run().unwrap();

        let commands = commands_sent(&peers);
        assert!(commands.contains(&"BATTERY_CONVERT_RESET".to_owned()));
        assert!(commands.contains(&"CAR_DROP".to_owned()));
        assert!(commands.contains(&"CAR_GRAB".to_owned()));
        assert!(commands.contains(&"BATTERY_STORAGE".to_owned()));
        assert!(commands.contains(&"BATTERY_REPLACE".to_owned()));
        assert!(!commands.contains(&"STOP_BATTERY_TRACK".to_owned()));
        // Every handshake ends with the brain clearing its channel.
        assert_eq!(peers.lock().broadcasts.last(), Some(&None));

        // The snapshot reached both the brain and the host.
        assert!(brain.rack_snapshot().is_some());
        let sent = port.lock().sent.clone();
        assert!(sent
            .iter()
            .any(|(kind, payload)| *kind == FrameKind::Storage && payload.len() == 6));
        assert!(sent
            .iter()
            .any(|(kind, payload)| *kind == FrameKind::Command && payload == b"INSPECT"));
    }

    #[test]
    fn dirty_pass_recycles() {
        let (mut brain, peers, _port) = sim_brain(Some("DIRTY"));
        brain.run().unwrap();
        let commands = commands_sent(&peers);
        assert!(commands.contains(&"STOP_BATTERY_TRACK".to_owned()));
        assert!(commands.contains(&"START_BATTERY_TRACK".to_owned()));
        assert!(!commands.contains(&"BATTERY_STORAGE".to_owned()));
        // The replacement still happens after a recycle.
        assert!(commands.contains(&"BATTERY_REPLACE".to_owned()));
    }

    #[test]
    fn silent_host_degrades_to_store() {
        let (mut brain, peers, _port) = sim_brain(None);
        brain.run().unwrap();
        let commands = commands_sent(&peers);
        assert!(commands.contains(&"BATTERY_STORAGE".to_owned()));
        assert!(!commands.contains(&"STOP_BATTERY_TRACK".to_owned()));
    }

    #[test]
    fn verdict_polling_sends_inspect_then_ready() {
        let (mut brain, _peers, port) = sim_brain(Some("CLEAN"));
        let verdict = brain.wait_for_verdict();
        assert_eq!(verdict, InspectionResult::Clean);
        let sent = port.lock().sent.clone();
        let commands: Vec<&[u8]> = sent
            .iter()
            .filter(|(kind, _)| *kind == FrameKind::Command)
            .map(|(_, payload)| payload.as_slice())
            .collect();
        assert_eq!(commands.first(), Some(&b"INSPECT".as_slice()));
        assert!(commands.contains(&b"RDY_FOR_RESULT".as_slice()));
    }

    #[test]
    fn uncalibrated_arm_move_is_fatal() {
        let (mut brain, _peers, _port) = sim_brain(Some("CLEAN"));
        assert!(matches!(
            brain.arm_to_move(),
            Err(BrainError::Uncalibrated { axis: Axis::Lift })
        ));
        assert!(matches!(
            brain.bed_to(100),
            Err(BrainError::Uncalibrated { axis: Axis::Bed })
        ));
        assert!(matches!(
            brain.toggle_gripper(),
            Err(BrainError::Uncalibrated { axis: Axis::Gripper })
        ));
    }

    #[test]
    fn calibration_flags_stick_after_reset() {
        let (mut brain, _peers, _port) = sim_brain(Some("CLEAN"));
        brain.reset().unwrap();
        assert!(brain.arm_to_move().is_ok());
        assert!(brain.bed_to(brain.geometry.bed_car).is_ok());
        assert!(brain.toggle_gripper().is_ok());
        assert!(brain.toggle_claw().is_ok());
    }
}
