//! Dual-axis motion synchronization.

/// Nominal axis speed in degrees per second.
pub const NOMINAL_SPEED: f32 = 360.0;

/// Speeds for two axes that must reach their targets together.
///
/// The axis with the larger absolute displacement runs at `nominal`; the
/// other is scaled by the displacement ratio so both moves finish at
/// approximately the same time without a trajectory planner. When the
/// larger displacement is zero, both axes get `nominal`.
pub fn synchronized_speeds(d_a: f32, d_b: f32, nominal: f32) -> (f32, f32) {
    let (da, db) = (d_a.abs(), d_b.abs());
    if da == 0.0 && db == 0.0 {
        return (nominal, nominal);
    }
    if da >= db {
        (nominal, nominal * db / da)
    } else {
        (nominal * da / db, nominal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smaller_displacement_scales_down() {
        let (speed_a, speed_b) = synchronized_speeds(100.0, 50.0, NOMINAL_SPEED);
        assert_eq!(speed_a, NOMINAL_SPEED);
        assert_eq!(speed_b, 0.5 * NOMINAL_SPEED);
    }

    #[test]
    fn larger_axis_is_never_scaled() {
        let (speed_a, speed_b) = synchronized_speeds(30.0, 120.0, NOMINAL_SPEED);
        assert_eq!(speed_b, NOMINAL_SPEED);
        assert_eq!(speed_a, 0.25 * NOMINAL_SPEED);
    }

    #[test]
    fn sign_of_displacement_is_irrelevant() {
        let (speed_a, speed_b) = synchronized_speeds(-100.0, 50.0, NOMINAL_SPEED);
        assert_eq!(speed_a, NOMINAL_SPEED);
        assert_eq!(speed_b, 0.5 * NOMINAL_SPEED);
    }

    #[test]
    fn zero_displacements_run_nominal() {
        assert_eq!(
            synchronized_speeds(0.0, 0.0, NOMINAL_SPEED),
            (NOMINAL_SPEED, NOMINAL_SPEED)
        );
    }

    #[test]
    fn equal_displacements_both_nominal() {
        assert_eq!(
            synchronized_speeds(75.0, -75.0, NOMINAL_SPEED),
            (NOMINAL_SPEED, NOMINAL_SPEED)
        );
    }

    #[test]
    fn one_sided_move_scales_idle_axis_to_zero() {
        let (speed_a, speed_b) = synchronized_speeds(0.0, 200.0, NOMINAL_SPEED);
        assert_eq!(speed_a, 0.0);
        assert_eq!(speed_b, NOMINAL_SPEED);
    }
}
