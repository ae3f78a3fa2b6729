use std::str::FromStr;
use std::time::Duration;

use estimator::FilterConfig;
use hal::ActuatorRange;
use pid::CascadeGains;

/// Which activities run, selected once at startup.
///
/// A single build supports every mode; there is no compile-time selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Full pipeline: estimation, control, actuator output
    #[default]
    Balance,

    /// Estimation and telemetry only; the actuator is held neutral
    AttitudeOnly,

    /// Raw sensor passthrough to telemetry; no estimation, no control
    RawSensor,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balance" => Ok(Mode::Balance),
            "attitude" => Ok(Mode::AttitudeOnly),
            "raw" => Ok(Mode::RawSensor),
            other => Err(format!(
                "unknown mode '{other}' (expected balance, attitude or raw)"
            )),
        }
    }
}

/// The single axis the controller stabilizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlledAxis {
    #[default]
    Roll,
    Pitch,
}

/// Complete startup configuration for the stabilization pipeline
#[derive(Debug, Clone, Copy)]
pub struct BalancerConfig {
    /// Complementary filter tuning; also fixes the estimator activity's
    /// period
    pub filter: FilterConfig,

    /// Cascaded controller gains
    pub gains: CascadeGains,

    /// Valid duty-cycle range of the balance actuator
    pub actuator_range: ActuatorRange,

    /// Angle the controlled axis is held at, in degrees
    pub target_angle: f32,

    pub axis: ControlledAxis,

    pub mode: Mode,

    /// Period of the control activity
    pub control_period: Duration,

    /// Period of the telemetry activity
    pub telemetry_period: Duration,

    /// Consecutive period overruns tolerated before the vehicle faults
    pub max_consecutive_overruns: u32,

    /// Consecutive control cycles that saw fresh estimator sensor faults
    /// before the vehicle faults
    pub sensor_fault_limit: u32,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            gains: CascadeGains::default(),
            actuator_range: ActuatorRange {
                min: 1000,
                max: 2000,
            },
            target_angle: 0.0,
            axis: ControlledAxis::default(),
            mode: Mode::default(),
            control_period: Duration::from_millis(2),
            telemetry_period: Duration::from_millis(100),
            max_consecutive_overruns: 5,
            sensor_fault_limit: 50,
        }
    }
}

impl BalancerConfig {
    /// Period of the estimator activity, derived from the filter's sample
    /// period so the integration half-step cannot drift apart from the
    /// actual scheduling rate
    pub fn estimator_period(&self) -> Duration {
        Duration::from_secs_f32(self.filter.sample_period)
    }
}
