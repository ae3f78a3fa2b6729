//! Single-axis balance stabilization core.
//!
//! Wires the attitude estimator and the cascaded axis controller into
//! periodic stages over published-snapshot shared state. Each stage is
//! exclusively owned by one scheduling activity; consistency between the
//! activities is guaranteed by [`Shared`], which only ever hands readers a
//! fully committed snapshot.

use thiserror::Error;

mod arming;
mod attitude;
mod command;
mod config;
mod state;
mod telemetry;
mod vehicle;

pub use arming::{ArmState, ArmingError, FaultReason};
pub use attitude::Attitude;
pub use command::{ActuatorCommand, ChannelMapper};
pub use config::{BalancerConfig, ControlledAxis, Mode};
pub use state::Shared;
pub use telemetry::{ControlTelemetry, TelemetryView};
pub use vehicle::{AttitudeStage, ControlStage, Vehicle};

/// Errors raised while assembling a vehicle from its configuration
#[derive(Error, Debug)]
pub enum BalancerError {
    #[error("invalid estimator configuration: {0}")]
    Estimator(#[from] estimator::EstimatorError),

    #[error("invalid controller configuration: {0}")]
    Controller(#[from] pid::PidError),

    #[error("actuator range [{min}, {max}] is empty")]
    EmptyActuatorRange { min: u16, max: u16 },

    #[error("target angle {0} is not a valid number")]
    InvalidTarget(f32),

    #[error("activity period must be non-zero")]
    ZeroPeriod,
}
