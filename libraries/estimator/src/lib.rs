//! # Estimator - Quaternion Complementary Attitude Filter
//!
//! The estimator module maintains a rigid body's orientation from six-axis
//! inertial samples. A complementary filter anchors high-rate gyro
//! integration (which drifts) to the accelerometer's gravity reference
//! (noisy but unbiased), producing a stable Euler-angle estimate without a
//! full stochastic filter.
//!
//! ## Units
//!
//! - Accelerometer samples in m/s² (only the direction is used)
//! - Gyroscope samples in rad/s
//! - Derived Euler angles in degrees

use thiserror::Error;

pub mod filter;
pub mod sensors;
pub mod utils;

pub use filter::{ComplementaryFilter, EulerAngles};
pub use sensors::ImuSample;

/// Errors that can occur while configuring the estimator
#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("Invalid filter gain: {0}")]
    InvalidGain(String),

    #[error("Invalid sample period: {0}")]
    InvalidSamplePeriod(f32),
}

/// Result type for estimator operations
pub type EstimatorResult<T> = Result<T, EstimatorError>;

/// Tuning for the complementary filter
///
/// `kp` and `ki` weight the accelerometer correction applied to the raw
/// gyro rates; `sample_period` is the estimator's scheduling period in
/// seconds. The quaternion integration half-step is derived from
/// `sample_period`, so the configured value must match the rate the filter
/// is actually stepped at.
#[derive(Debug, Clone, Copy)]
pub struct FilterConfig {
    /// Proportional fusion gain applied to the instantaneous gravity error
    pub kp: f32,

    /// Integral fusion gain accumulating the gravity error into the
    /// per-axis bias terms
    pub ki: f32,

    /// Sample period in seconds between successive `update` calls
    pub sample_period: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kp: 100.0,
            ki: 0.002,
            sample_period: 0.002,
        }
    }
}

impl FilterConfig {
    /// Validate the configuration
    pub fn validate(&self) -> EstimatorResult<()> {
        if !self.kp.is_finite() || self.kp < 0.0 {
            return Err(EstimatorError::InvalidGain(format!(
                "kp value {} must be finite and non-negative",
                self.kp
            )));
        }
        if !self.ki.is_finite() || self.ki < 0.0 {
            return Err(EstimatorError::InvalidGain(format!(
                "ki value {} must be finite and non-negative",
                self.ki
            )));
        }
        if !self.sample_period.is_finite() || self.sample_period <= 0.0 {
            return Err(EstimatorError::InvalidSamplePeriod(self.sample_period));
        }
        Ok(())
    }
}

/// Per-cycle fault counters maintained by the filter
///
/// The filter never aborts on bad input; it recovers locally and counts the
/// event here for the telemetry consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterHealth {
    /// Cycles where the accelerometer vector was degenerate and the fusion
    /// correction was skipped (gyro-only fallback)
    pub accel_rejections: u32,

    /// Cycles dropped entirely because a sample contained non-finite values
    pub sensor_faults: u32,

    /// Times the quaternion norm collapsed and the filter reset to identity
    pub resets: u32,
}
