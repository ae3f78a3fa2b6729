use nalgebra as na;

use crate::sensors::ImuSample;
use crate::utils::rad_to_deg;
use crate::{EstimatorResult, FilterConfig, FilterHealth};

/// Accelerometer vectors shorter than this carry no usable gravity direction
const MIN_ACCEL_NORM: f32 = 1e-6;

/// Below this the quaternion has collapsed and must be re-seeded
const MIN_QUAT_NORM: f32 = 1e-6;

/// Euler angles derived from the orientation quaternion, in degrees
///
/// Pitch is in (-90°, 90°], roll and yaw in (-180°, 180°]. Always recomputed
/// from the quaternion; never the source of truth.
#[derive(Default, Debug, Clone, Copy)]
pub struct EulerAngles {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

/// Quaternion complementary filter fusing gyro and accelerometer samples
///
/// Owns the orientation quaternion and the three gyro-bias integral
/// accumulators. The quaternion is renormalized every cycle; after each
/// successful update its norm is 1 within numerical tolerance.
pub struct ComplementaryFilter {
    q: na::Quaternion<f32>,
    bias: na::Vector3<f32>,
    half_dt: f32,
    config: FilterConfig,
    health: FilterHealth,
}

impl ComplementaryFilter {
    /// Create a filter at the identity orientation with zeroed bias integrals
    pub fn new(config: FilterConfig) -> EstimatorResult<Self> {
        config.validate()?;
        Ok(Self {
            q: na::Quaternion::new(1.0, 0.0, 0.0, 0.0),
            bias: na::Vector3::zeros(),
            half_dt: config.sample_period / 2.0,
            config,
            health: FilterHealth::default(),
        })
    }

    /// Advance the orientation estimate by one sample period
    ///
    /// Degenerate input never aborts the loop: a non-finite sample drops the
    /// cycle, a zero-norm accelerometer vector falls back to gyro-only
    /// integration, and a collapsed quaternion re-seeds at identity. Every
    /// such event is counted in [`FilterHealth`].
    pub fn update(&mut self, sample: &ImuSample) -> EulerAngles {
        if !sample.is_finite() {
            self.health.sensor_faults += 1;
            return self.angles();
        }

        let mut rate = sample.gyro;

        let accel_norm = sample.accel.norm();
        if accel_norm.is_finite() && accel_norm > MIN_ACCEL_NORM {
            let acc = sample.accel / accel_norm;

            // Gravity direction predicted by the current quaternion: third
            // row of the equivalent rotation matrix, written out in
            // components so no matrix is materialized.
            let (q0, q1, q2, q3) = (self.q.w, self.q.i, self.q.j, self.q.k);
            let predicted = na::Vector3::new(
                2.0 * (q1 * q3 - q0 * q2),
                2.0 * (q0 * q1 + q2 * q3),
                q0 * q0 - q1 * q1 - q2 * q2 + q3 * q3,
            );

            // Zero exactly when the estimated down-axis matches measured
            // gravity.
            let error = acc.cross(&predicted);

            self.bias += error * self.config.ki;
            rate += error * self.config.kp + self.bias;
        } else {
            // No gravity reference this cycle. Keep the standing bias
            // correction but skip the proportional/integral fusion step.
            self.health.accel_rejections += 1;
            rate += self.bias;
        }

        // Quaternion kinematics, first-order integration over the half-step.
        let (q0, q1, q2, q3) = (self.q.w, self.q.i, self.q.j, self.q.k);
        let (gx, gy, gz) = (rate.x, rate.y, rate.z);
        let qdot = na::Quaternion::new(
            -q1 * gx - q2 * gy - q3 * gz,
            q0 * gx + q2 * gz - q3 * gy,
            q0 * gy - q1 * gz + q3 * gx,
            q0 * gz + q1 * gy - q2 * gx,
        );
        self.q = self.q + qdot * self.half_dt;

        let norm = self.q.norm();
        if norm.is_finite() && norm > MIN_QUAT_NORM {
            self.q = self.q * (1.0 / norm);
        } else {
            // The bias integrals were accumulated against the discarded
            // orientation, so they go too.
            self.reset();
            self.health.resets += 1;
        }

        self.angles()
    }

    /// Euler angles derived from the current quaternion, in degrees
    pub fn angles(&self) -> EulerAngles {
        let (q0, q1, q2, q3) = (self.q.w, self.q.i, self.q.j, self.q.k);

        let sin_pitch = 2.0 * (q0 * q2 - q1 * q3);
        let pitch = if sin_pitch.abs() >= 1.0 {
            core::f32::consts::FRAC_PI_2.copysign(sin_pitch)
        } else {
            sin_pitch.asin()
        };

        let roll = (2.0 * (q2 * q3 + q0 * q1)).atan2(1.0 - 2.0 * (q1 * q1 + q2 * q2));
        let yaw = (2.0 * (q1 * q2 + q0 * q3)).atan2(q0 * q0 + q1 * q1 - q2 * q2 - q3 * q3);

        EulerAngles {
            roll: rad_to_deg(roll),
            pitch: rad_to_deg(pitch),
            yaw: rad_to_deg(yaw),
        }
    }

    /// Current orientation quaternion (scalar-first, unit norm)
    pub fn quaternion(&self) -> na::Quaternion<f32> {
        self.q
    }

    /// Fault counters accumulated since construction or the last `reset`
    pub fn health(&self) -> FilterHealth {
        self.health
    }

    /// Restore the identity orientation and zero the bias integrals
    ///
    /// Fault counters are left intact so telemetry keeps the history.
    pub fn reset(&mut self) {
        self.q = na::Quaternion::new(1.0, 0.0, 0.0, 0.0);
        self.bias = na::Vector3::zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::deg_to_rad;

    const GRAVITY: f32 = 9.81;

    fn level_sample() -> ImuSample {
        ImuSample::new(
            na::Vector3::new(0.0, 0.0, GRAVITY),
            na::Vector3::zeros(),
        )
    }

    #[test]
    fn test_quaternion_norm_invariant() {
        let mut filter = ComplementaryFilter::new(FilterConfig::default()).unwrap();
        for i in 0..500 {
            let t = i as f32 * 0.002;
            let sample = ImuSample::new(
                na::Vector3::new(0.3 * t.sin(), -0.2 * t.cos(), GRAVITY + 0.1 * t.sin()),
                na::Vector3::new(0.5 * t.cos(), 0.4 * t.sin(), -0.3 * t.cos()),
            );
            filter.update(&sample);
            let norm = filter.quaternion().norm();
            assert!(
                (norm - 1.0).abs() < 1e-6,
                "quaternion norm {} drifted from unity at cycle {}",
                norm,
                i
            );
        }
    }

    #[test]
    fn test_fusion_converges_to_gravity_reference() {
        let mut filter = ComplementaryFilter::new(FilterConfig::default()).unwrap();

        // Hold the body at a 20° tilt; the filter must converge onto the
        // accelerometer's gravity direction from the identity orientation.
        let tilt = deg_to_rad(20.0);
        let tilted = ImuSample::new(
            na::Vector3::new(0.0, GRAVITY * tilt.sin(), GRAVITY * tilt.cos()),
            na::Vector3::zeros(),
        );
        for _ in 0..1500 {
            filter.update(&tilted);
        }
        let angles = filter.angles();
        assert!(
            (angles.roll.abs() - 20.0).abs() < 1.0,
            "roll {} did not converge near the 20° reference",
            angles.roll
        );
        assert!(angles.pitch.abs() < 1.0, "pitch {} should stay level", angles.pitch);

        // Back to level: pitch and roll must return to zero.
        for _ in 0..1500 {
            filter.update(&level_sample());
        }
        let angles = filter.angles();
        assert!(angles.roll.abs() < 0.3, "roll {} did not re-converge", angles.roll);
        assert!(angles.pitch.abs() < 0.3, "pitch {} did not re-converge", angles.pitch);
        assert_eq!(filter.health(), FilterHealth::default());
    }

    #[test]
    fn test_pure_gyro_integration_matches_analytic_angle() {
        // With both fusion gains zeroed the filter is a pure gyro
        // integrator: N cycles at a constant rate must match the closed-form
        // integral over N * sample_period.
        let config = FilterConfig {
            kp: 0.0,
            ki: 0.0,
            sample_period: 0.002,
        };
        let mut filter = ComplementaryFilter::new(config).unwrap();
        let rate = 0.5; // rad/s about the roll axis
        let cycles = 1000;
        let sample = ImuSample::new(
            na::Vector3::new(0.0, 0.0, GRAVITY),
            na::Vector3::new(rate, 0.0, 0.0),
        );
        for _ in 0..cycles {
            filter.update(&sample);
        }
        let expected = rad_to_deg(rate * cycles as f32 * config.sample_period);
        let angles = filter.angles();
        assert!(
            (angles.roll - expected).abs() < 0.2,
            "roll {} diverged from analytic {}",
            angles.roll,
            expected
        );
    }

    #[test]
    fn test_zero_norm_accel_falls_back_to_gyro_only() {
        let mut filter = ComplementaryFilter::new(FilterConfig::default()).unwrap();
        let free_fall = ImuSample::new(
            na::Vector3::zeros(),
            na::Vector3::new(0.5, 0.0, 0.0),
        );
        for _ in 0..100 {
            filter.update(&free_fall);
        }
        let health = filter.health();
        assert_eq!(health.accel_rejections, 100);
        assert_eq!(health.sensor_faults, 0);
        // Gyro integration kept running through the fallback.
        let expected = rad_to_deg(0.5 * 100.0 * 0.002);
        assert!((filter.angles().roll - expected).abs() < 0.2);
        assert!((filter.quaternion().norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_sample_drops_cycle() {
        let mut filter = ComplementaryFilter::new(FilterConfig::default()).unwrap();
        for _ in 0..50 {
            filter.update(&level_sample());
        }
        let before = filter.quaternion();

        let bad_accel = ImuSample::new(
            na::Vector3::new(f32::NAN, 0.0, GRAVITY),
            na::Vector3::zeros(),
        );
        filter.update(&bad_accel);
        let bad_gyro = ImuSample::new(
            na::Vector3::new(0.0, 0.0, GRAVITY),
            na::Vector3::new(0.0, f32::INFINITY, 0.0),
        );
        filter.update(&bad_gyro);

        assert_eq!(filter.health().sensor_faults, 2);
        assert_eq!(filter.quaternion(), before, "dropped cycles must not touch the state");
    }

    #[test]
    fn test_quaternion_collapse_resets_to_identity() {
        let mut filter = ComplementaryFilter::new(FilterConfig::default()).unwrap();
        // A finite but absurd rate overflows the norm computation and must
        // trigger the identity reset rather than propagate infinities.
        let absurd = ImuSample::new(
            na::Vector3::new(0.0, 0.0, GRAVITY),
            na::Vector3::new(1e30, 0.0, 0.0),
        );
        filter.update(&absurd);
        assert_eq!(filter.health().resets, 1);
        assert_eq!(filter.quaternion(), na::Quaternion::new(1.0, 0.0, 0.0, 0.0));

        // The filter keeps estimating normally afterwards.
        for _ in 0..10 {
            filter.update(&level_sample());
        }
        assert!((filter.quaternion().norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad_gain = FilterConfig {
            kp: f32::NAN,
            ..FilterConfig::default()
        };
        assert!(ComplementaryFilter::new(bad_gain).is_err());

        let bad_period = FilterConfig {
            sample_period: 0.0,
            ..FilterConfig::default()
        };
        assert!(ComplementaryFilter::new(bad_period).is_err());
    }
}
