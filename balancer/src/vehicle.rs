use estimator::utils::rad_to_deg;
use estimator::{ComplementaryFilter, FilterHealth, ImuSample};
use pid::CascadeController;

use crate::telemetry::ControlTelemetry;
use crate::{
    ActuatorCommand, ArmState, ArmingError, Attitude, BalancerConfig, BalancerError,
    ChannelMapper, ControlledAxis, FaultReason, Mode, Shared, TelemetryView,
};

/// The assembled stabilization pipeline before it is handed out to the
/// periodic activities.
pub struct Vehicle {
    config: BalancerConfig,
    filter: ComplementaryFilter,
    controller: CascadeController,
    mapper: ChannelMapper,
}

impl Vehicle {
    /// Validate the configuration and assemble the pipeline
    pub fn new(config: BalancerConfig) -> Result<Self, BalancerError> {
        if !config.target_angle.is_finite() {
            return Err(BalancerError::InvalidTarget(config.target_angle));
        }
        if config.control_period.is_zero() || config.telemetry_period.is_zero() {
            return Err(BalancerError::ZeroPeriod);
        }
        let filter = ComplementaryFilter::new(config.filter)?;
        let controller = CascadeController::new(config.gains)?;
        let mapper = ChannelMapper::new(config.actuator_range)?;
        Ok(Self {
            config,
            filter,
            controller,
            mapper,
        })
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    /// Split into per-activity stages.
    ///
    /// Each stage is exclusively owned by one periodic activity; the only
    /// coupling between them is the published-snapshot state created here.
    pub fn split(self) -> (AttitudeStage, ControlStage, TelemetryView) {
        let attitude = Shared::new(Attitude::default());
        let health = Shared::new(FilterHealth::default());
        let raw = Shared::new(ImuSample::default());
        let control = Shared::new(ControlTelemetry::default());

        let attitude_stage = AttitudeStage {
            filter: self.filter,
            mode: self.config.mode,
            attitude_out: attitude.clone(),
            health_out: health.clone(),
            raw_out: raw.clone(),
        };
        let control_stage = ControlStage {
            controller: self.controller,
            mapper: self.mapper,
            arming: ArmState::default(),
            mode: self.config.mode,
            axis: self.config.axis,
            target: self.config.target_angle,
            sensor_fault_limit: self.config.sensor_fault_limit,
            seen_sensor_faults: 0,
            fault_streak: 0,
            attitude_in: attitude.clone(),
            health_in: health.clone(),
            control_out: control.clone(),
        };
        let telemetry = TelemetryView::new(
            self.config.mode,
            self.config.axis,
            attitude,
            health,
            raw,
            control,
        );
        (attitude_stage, control_stage, telemetry)
    }
}

/// Estimation activity: owns the complementary filter, publishes the
/// orientation snapshot.
pub struct AttitudeStage {
    filter: ComplementaryFilter,
    mode: Mode,
    attitude_out: Shared<Attitude>,
    health_out: Shared<FilterHealth>,
    raw_out: Shared<ImuSample>,
}

impl AttitudeStage {
    /// Run one estimation cycle on a fresh sample.
    ///
    /// A non-finite sample is counted by the filter and does not replace
    /// the last committed attitude, so consumers keep reading the previous
    /// good estimate.
    pub fn step(&mut self, sample: &ImuSample) -> Attitude {
        self.raw_out.publish(*sample);
        if self.mode == Mode::RawSensor {
            return Attitude::default();
        }

        let angles = self.filter.update(sample);
        let attitude = Attitude {
            roll: angles.roll,
            pitch: angles.pitch,
            yaw: angles.yaw,
            roll_rate: rad_to_deg(sample.gyro.x),
            pitch_rate: rad_to_deg(sample.gyro.y),
            yaw_rate: rad_to_deg(sample.gyro.z),
        };
        if sample.is_finite() {
            self.attitude_out.publish(attitude);
        }
        self.health_out.publish(self.filter.health());
        attitude
    }
}

/// Control activity: owns the cascaded controller, the channel mapper and
/// the arming gate.
pub struct ControlStage {
    controller: CascadeController,
    mapper: ChannelMapper,
    arming: ArmState,
    mode: Mode,
    axis: ControlledAxis,
    target: f32,
    sensor_fault_limit: u32,
    seen_sensor_faults: u32,
    fault_streak: u32,
    attitude_in: Shared<Attitude>,
    health_in: Shared<FilterHealth>,
    control_out: Shared<ControlTelemetry>,
}

impl ControlStage {
    /// Arm the actuator path. The recurrence state is cleared so a stale
    /// integral cannot kick the actuator on the first armed cycle.
    pub fn arm(&mut self) -> Result<(), ArmingError> {
        self.arming.arm()?;
        self.controller.reset();
        Ok(())
    }

    pub fn disarm(&mut self) {
        self.arming.disarm();
        self.controller.reset();
    }

    /// Latch a fault; the actuator is held neutral until an operator
    /// disarm clears it.
    pub fn fault(&mut self, reason: FaultReason) {
        self.arming.fault(reason);
    }

    pub fn arm_state(&self) -> ArmState {
        self.arming
    }

    /// Run one control cycle against the latest committed attitude.
    ///
    /// The estimator may run at a different cadence; this stage simply
    /// consumes whatever snapshot is current. Returns the command the
    /// caller writes to the actuator.
    pub fn step(&mut self) -> ActuatorCommand {
        let health = self.health_in.snapshot();
        let fresh_faults = health.sensor_faults.saturating_sub(self.seen_sensor_faults);
        self.seen_sensor_faults = health.sensor_faults;
        if fresh_faults > 0 {
            self.fault_streak += 1;
        } else {
            self.fault_streak = 0;
        }
        if self.sensor_fault_limit > 0 && self.fault_streak >= self.sensor_fault_limit {
            self.arming.fault(FaultReason::SensorFault);
        }

        let attitude = self.attitude_in.snapshot();
        let (angle, rate) = match self.axis {
            ControlledAxis::Roll => (attitude.roll, attitude.roll_rate),
            ControlledAxis::Pitch => (attitude.pitch, attitude.pitch_rate),
        };

        // The recurrence keeps running while disarmed so the terms can be
        // observed on the bench; only the actuator write is gated.
        let output = if self.mode == Mode::Balance {
            self.controller.update(self.target, angle, rate)
        } else {
            0.0
        };

        let command = if self.arming.is_armed() && self.mode == Mode::Balance {
            self.mapper.map(output)
        } else {
            self.mapper.neutral()
        };

        self.control_out.publish(ControlTelemetry {
            terms: self.controller.terms(),
            inner_last: self.controller.inner_last(),
            outer_last: self.controller.outer_last(),
            command,
            arm_state: self.arming,
            saturation_events: self.mapper.saturation_events(),
        });
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estimator::utils::deg_to_rad;
    use hal::Vector3;

    const GRAVITY: f32 = 9.81;

    fn tilted_sample(roll_deg: f32) -> ImuSample {
        let tilt = deg_to_rad(roll_deg);
        ImuSample::new(
            Vector3::new(0.0, GRAVITY * tilt.sin(), GRAVITY * tilt.cos()),
            Vector3::zeros(),
        )
    }

    #[test]
    fn test_disarmed_vehicle_holds_neutral() {
        let vehicle = Vehicle::new(BalancerConfig::default()).unwrap();
        let (mut attitude, mut control, _telemetry) = vehicle.split();

        for _ in 0..200 {
            attitude.step(&tilted_sample(10.0));
        }
        let command = control.step();
        assert_eq!(command.channel1, 1500);
        assert_eq!(command.channel2, 1500);
    }

    #[test]
    fn test_armed_vehicle_reacts_to_tilt() {
        let vehicle = Vehicle::new(BalancerConfig::default()).unwrap();
        let (mut attitude, mut control, _telemetry) = vehicle.split();
        control.arm().unwrap();

        for _ in 0..1500 {
            attitude.step(&tilted_sample(10.0));
        }
        let command = control.step();
        assert_ne!(
            command.channel1, command.channel2,
            "a tilted vehicle must command a correction"
        );
        assert_eq!(command.channel1 as u32 + command.channel2 as u32, 3000);

        control.disarm();
        let command = control.step();
        assert_eq!(command.channel1, 1500);
        assert_eq!(command.channel2, 1500);
    }

    #[test]
    fn test_fault_forces_neutral_and_blocks_arming() {
        let vehicle = Vehicle::new(BalancerConfig::default()).unwrap();
        let (mut attitude, mut control, _telemetry) = vehicle.split();
        control.arm().unwrap();

        for _ in 0..100 {
            attitude.step(&tilted_sample(15.0));
        }
        control.fault(FaultReason::DeadlineMiss);
        let command = control.step();
        assert_eq!(command.channel1, 1500);
        assert_eq!(command.channel2, 1500);
        assert!(matches!(
            control.arm(),
            Err(ArmingError::Faulted(FaultReason::DeadlineMiss))
        ));

        control.disarm();
        control.arm().unwrap();
    }

    #[test]
    fn test_persistent_sensor_faults_escalate() {
        let config = BalancerConfig {
            sensor_fault_limit: 3,
            ..BalancerConfig::default()
        };
        let vehicle = Vehicle::new(config).unwrap();
        let (mut attitude, mut control, _telemetry) = vehicle.split();
        control.arm().unwrap();

        let bad = ImuSample::new(Vector3::new(f32::NAN, 0.0, 0.0), Vector3::zeros());
        for _ in 0..3 {
            attitude.step(&bad);
            control.step();
        }
        assert_eq!(
            control.arm_state(),
            ArmState::Fault(FaultReason::SensorFault)
        );
    }

    #[test]
    fn test_raw_sensor_mode_bypasses_pipeline() {
        let config = BalancerConfig {
            mode: Mode::RawSensor,
            ..BalancerConfig::default()
        };
        let vehicle = Vehicle::new(config).unwrap();
        let (mut attitude, mut control, telemetry) = vehicle.split();

        attitude.step(&tilted_sample(30.0));
        let snapshot = telemetry.attitude();
        assert_eq!(snapshot.roll, 0.0, "raw mode must not estimate");

        let command = control.step();
        assert_eq!(
            command,
            ActuatorCommand {
                channel1: 1500,
                channel2: 1500,
            }
        );
        assert!(telemetry.report().starts_with("aX:"));
    }

    #[test]
    fn test_telemetry_report_shows_controller_internals() {
        let vehicle = Vehicle::new(BalancerConfig::default()).unwrap();
        let (mut attitude, mut control, telemetry) = vehicle.split();
        control.arm().unwrap();
        for _ in 0..50 {
            attitude.step(&tilted_sample(5.0));
            control.step();
        }
        let report = telemetry.report();
        let expected = [
            "Pitch Angle:",
            "Motor duty:",
            "P:",
            "I:",
            "D:",
            "Output:",
            "ARMED",
        ];
        for needle in expected {
            assert!(
                report.contains(needle),
                "report missing '{}':\n{}",
                needle,
                report
            );
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BalancerConfig {
            target_angle: f32::NAN,
            ..BalancerConfig::default()
        };
        assert!(matches!(
            Vehicle::new(config),
            Err(BalancerError::InvalidTarget(_))
        ));

        let config = BalancerConfig {
            control_period: std::time::Duration::ZERO,
            ..BalancerConfig::default()
        };
        assert!(matches!(Vehicle::new(config), Err(BalancerError::ZeroPeriod)));
    }
}
