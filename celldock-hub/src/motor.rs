//! Motor and sensor seams for the hub hardware.

use std::time::Duration;

use celldock_core::motion::{synchronized_speeds, NOMINAL_SPEED};
use celldock_core::SlotColor;

/// Positional motor, angles in degrees. Speeds passed to target moves are
/// magnitudes; the drive picks the direction from the target.
pub trait Motor {
    /// Current angle relative to the last `reset_angle`.
    fn angle(&self) -> i32;
    /// Redefine the current position as `angle`.
    fn reset_angle(&mut self, angle: i32);
    /// Run to `target` and hold; returns when the move completes.
    fn run_target(&mut self, speed: f32, target: i32);
    /// Start a move to `target` without waiting for it.
    fn start_run_target(&mut self, speed: f32, target: i32);
    /// Whether the last started move has completed.
    fn done(&self) -> bool;
    /// Run toward an end stop until the mechanism stalls; returns the
    /// stall angle. Signed speed picks the direction.
    fn run_until_stalled(&mut self, speed: f32, duty_limit: u8) -> i32;
    /// Run at constant signed speed until `stop`.
    fn run(&mut self, speed: f32);
    fn stop(&mut self);
    /// Open-loop duty cycle, -100..=100.
    fn dc(&mut self, duty: i8);
}

/// Color sensor watching the carousel slots.
pub trait ColorSensor {
    fn color(&mut self) -> Option<SlotColor>;
}

/// Completion poll step for paired moves.
const MOVE_POLL: Duration = Duration::from_millis(10);

/// Drive two axes to their targets so they arrive together: the larger
/// displacement runs at nominal speed, the other is scaled down by the
/// displacement ratio.
pub fn move_pair(a: &mut dyn Motor, target_a: i32, b: &mut dyn Motor, target_b: i32) {
    let d_a = (target_a - a.angle()) as f32;
    let d_b = (target_b - b.angle()) as f32;
    let (speed_a, speed_b) = synchronized_speeds(d_a, d_b, NOMINAL_SPEED);
    a.start_run_target(speed_a, target_a);
    b.start_run_target(speed_b, target_b);
    while !a.done() || !b.done() {
        std::thread::sleep(MOVE_POLL);
    }
}
