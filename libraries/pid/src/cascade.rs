// Cascaded rate/angle controller for a single balance axis
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PidError {
    #[error("Invalid gain configuration: {0}")]
    InvalidGain(String),

    #[error("Invalid integral limit: {0} must be non-negative and finite")]
    InvalidIntegralLimit(f32),
}

/// Gain set for the cascaded controller.
///
/// The outer (angle) loop is a full PID toward the target angle; its output
/// is the rate setpoint tracked by the inner (rate) PD loop. All values are
/// empirically tuned configuration in the actuator's duty-cycle units per
/// degree (outer) and per degree/second (inner); none are derived from
/// vehicle physics.
#[derive(Debug, Clone, Copy)]
pub struct CascadeGains {
    /// Outer loop proportional gain on the angle error
    pub angle_kp: f32,

    /// Outer loop integral gain; the accumulator grows by `angle_ki * error`
    /// each cycle
    pub angle_ki: f32,

    /// Outer loop derivative gain, backward difference on the measured angle
    pub angle_kd: f32,

    /// Inner loop proportional gain on the rate error
    pub rate_kp: f32,

    /// Inner loop derivative gain, backward difference on the measured rate
    pub rate_kd: f32,

    /// Bound on the outer integral accumulator; zero disables the limit
    pub max_integral: f32,
}

impl Default for CascadeGains {
    fn default() -> Self {
        Self {
            angle_kp: 8.0,
            angle_ki: 0.02,
            angle_kd: 0.4,
            rate_kp: 1.2,
            rate_kd: 0.05,
            max_integral: 200.0,
        }
    }
}

impl CascadeGains {
    /// Validate the gain set
    ///
    /// Gains may be negative (axis conventions differ between airframes)
    /// but must be finite. The integral limit must be non-negative.
    pub fn validate(&self) -> Result<(), PidError> {
        let named = [
            ("angle_kp", self.angle_kp),
            ("angle_ki", self.angle_ki),
            ("angle_kd", self.angle_kd),
            ("rate_kp", self.rate_kp),
            ("rate_kd", self.rate_kd),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(PidError::InvalidGain(format!(
                    "{name} value {value} is not a valid number"
                )));
            }
        }
        if !self.max_integral.is_finite() || self.max_integral < 0.0 {
            return Err(PidError::InvalidIntegralLimit(self.max_integral));
        }
        Ok(())
    }
}

/// Terms retained from the most recent update, for telemetry and tuning.
///
/// `p` and `d` come from the inner (rate) stage; `i` is the outer integral
/// accumulator, the only integral in the cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidTerms {
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub output: f32,
}

/// Cascaded angle/rate controller state for one controlled axis.
///
/// A pure difference-equation recurrence over the previous rate sample, the
/// previous angle sample and the outer integral accumulator; it has no
/// modes of its own. Arming and fault gating happen in the consumer.
#[derive(Debug, Default)]
pub struct CascadeController {
    gains: CascadeGains,
    inner_last: f32,
    outer_last: f32,
    integral: f32,
    terms: PidTerms,
}

impl CascadeController {
    pub fn new(gains: CascadeGains) -> Result<Self, PidError> {
        gains.validate()?;
        Ok(Self {
            gains,
            inner_last: 0.0,
            outer_last: 0.0,
            integral: 0.0,
            terms: PidTerms::default(),
        })
    }

    /// Run one control cycle.
    ///
    /// `target` and `angle` are in degrees, `rate` in degrees per second;
    /// the return value is the scalar correction in duty-cycle units, later
    /// mapped onto the two complementary actuator channels. Non-finite
    /// input returns zero without touching the recurrence state.
    pub fn update(&mut self, target: f32, angle: f32, rate: f32) -> f32 {
        if !target.is_finite() || !angle.is_finite() || !rate.is_finite() {
            return 0.0;
        }

        // Outer (angle) loop. Derivative by backward difference on the
        // measurement, so a target step does not kick it.
        let error = target - angle;
        self.integral += self.gains.angle_ki * error;
        if self.gains.max_integral > 0.0 {
            self.integral = self
                .integral
                .clamp(-self.gains.max_integral, self.gains.max_integral);
        }
        let outer_d = -self.gains.angle_kd * (angle - self.outer_last);
        let rate_setpoint = self.gains.angle_kp * error + self.integral + outer_d;
        self.outer_last = angle;

        // Inner (rate) loop tracking the outer loop's rate setpoint.
        let rate_error = rate_setpoint - rate;
        let p = self.gains.rate_kp * rate_error;
        let d = -self.gains.rate_kd * (rate - self.inner_last);
        self.inner_last = rate;

        let output = p + d;
        self.terms = PidTerms {
            p,
            i: self.integral,
            d,
            output,
        };
        output
    }

    /// Terms computed by the most recent update
    pub fn terms(&self) -> PidTerms {
        self.terms
    }

    /// Previous rate sample held for the inner backward difference
    pub fn inner_last(&self) -> f32 {
        self.inner_last
    }

    /// Previous angle sample held for the outer backward difference
    pub fn outer_last(&self) -> f32 {
        self.outer_last
    }

    pub fn gains(&self) -> CascadeGains {
        self.gains
    }

    pub fn set_gains(&mut self, gains: CascadeGains) -> Result<(), PidError> {
        gains.validate()?;
        self.gains = gains;
        Ok(())
    }

    /// Clear the recurrence state; called when the vehicle disarms so a
    /// stale integral cannot kick the actuator on the next arm.
    pub fn reset(&mut self) {
        self.inner_last = 0.0;
        self.outer_last = 0.0;
        self.integral = 0.0;
        self.terms = PidTerms::default();
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::{CascadeController, CascadeGains, PidTerms};

    #[test]
    fn test_recurrence_matches_reference() {
        let gains = CascadeGains {
            angle_kp: 2.0,
            angle_ki: 0.1,
            angle_kd: 0.5,
            rate_kp: 1.5,
            rate_kd: 0.25,
            max_integral: 0.0,
        };
        let mut controller = CascadeController::new(gains).unwrap();

        // Scripted feedback trace, target fixed at zero.
        let samples = [
            (4.0_f32, 10.0_f32),
            (3.2, -8.0),
            (2.1, -6.5),
            (0.9, -4.0),
            (-0.3, -1.5),
            (-0.8, 1.0),
        ];

        // Independent replay of the published recurrence.
        let (mut integral, mut outer_last, mut inner_last) = (0.0_f32, 0.0_f32, 0.0_f32);
        for (angle, rate) in samples {
            let error = 0.0 - angle;
            integral += gains.angle_ki * error;
            let setpoint =
                gains.angle_kp * error + integral - gains.angle_kd * (angle - outer_last);
            outer_last = angle;
            let expected = gains.rate_kp * (setpoint - rate)
                - gains.rate_kd * (rate - inner_last);
            inner_last = rate;

            let output = controller.update(0.0, angle, rate);
            assert!(
                (output - expected).abs() < 1e-5,
                "output {} diverged from reference {} at angle {}",
                output,
                expected,
                angle
            );
            assert!((controller.terms().output - output).abs() < 1e-6);
        }
    }

    #[test]
    fn test_integral_accumulates_and_clamps() {
        let gains = CascadeGains {
            angle_ki: 0.5,
            max_integral: 2.0,
            ..CascadeGains::default()
        };
        let mut controller = CascadeController::new(gains).unwrap();

        // Constant error of 1°, integral grows 0.5 per cycle until the
        // clamp at 2.0 holds it.
        for _ in 0..3 {
            controller.update(1.0, 0.0, 0.0);
        }
        assert!((controller.terms().i - 1.5).abs() < 1e-6);
        for _ in 0..10 {
            controller.update(1.0, 0.0, 0.0);
        }
        assert!((controller.terms().i - 2.0).abs() < 1e-6, "integral must clamp");
    }

    #[test]
    fn test_target_step_does_not_kick_derivative() {
        let mut controller = CascadeController::new(CascadeGains::default()).unwrap();
        controller.update(0.0, 1.0, 2.0);

        // Measurements unchanged, target jumps: both backward differences
        // are zero, so the derivative terms must be too.
        controller.update(15.0, 1.0, 2.0);
        let terms = controller.terms();
        assert_eq!(terms.d, 0.0);
        assert!(terms.p.abs() > 0.0, "proportional path must still react");
    }

    #[test]
    fn test_non_finite_input_returns_zero_and_preserves_state() {
        let mut controller = CascadeController::new(CascadeGains::default()).unwrap();
        controller.update(0.0, 2.0, 1.0);
        let terms_before = controller.terms();

        assert_eq!(controller.update(0.0, f32::NAN, 1.0), 0.0);
        assert_eq!(controller.update(f32::INFINITY, 2.0, 1.0), 0.0);
        assert_eq!(controller.terms(), terms_before);
        assert_eq!(controller.outer_last(), 2.0);
        assert_eq!(controller.inner_last(), 1.0);
    }

    #[test]
    fn test_reset_clears_recurrence_state() {
        let mut controller = CascadeController::new(CascadeGains::default()).unwrap();
        for i in 0..5 {
            controller.update(0.0, i as f32, -(i as f32));
        }
        controller.reset();
        assert_eq!(controller.inner_last(), 0.0);
        assert_eq!(controller.outer_last(), 0.0);
        assert_eq!(controller.terms(), PidTerms::default());
    }

    #[test]
    fn test_invalid_gains_rejected() {
        let bad = CascadeGains {
            angle_kp: f32::NAN,
            ..CascadeGains::default()
        };
        assert!(CascadeController::new(bad).is_err());

        let bad_limit = CascadeGains {
            max_integral: -1.0,
            ..CascadeGains::default()
        };
        assert!(CascadeController::new(bad_limit).is_err());
    }
}
