use std::fmt::Write;

use estimator::{FilterHealth, ImuSample};
use pid::PidTerms;

use crate::{ActuatorCommand, ArmState, Attitude, ControlledAxis, Mode, Shared};

/// Controller internals published after every control cycle, enough to
/// render the serial tuning screen
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlTelemetry {
    pub terms: PidTerms,

    /// Previous rate sample held for the inner backward difference
    pub inner_last: f32,

    /// Previous angle sample held for the outer backward difference
    pub outer_last: f32,

    pub command: ActuatorCommand,
    pub arm_state: ArmState,
    pub saturation_events: u32,
}

/// Read-only consumer handed to the telemetry activity.
///
/// Samples whatever the other activities most recently committed; it never
/// writes back into the pipeline.
pub struct TelemetryView {
    mode: Mode,
    axis: ControlledAxis,
    attitude: Shared<Attitude>,
    health: Shared<FilterHealth>,
    raw: Shared<ImuSample>,
    control: Shared<ControlTelemetry>,
}

impl TelemetryView {
    pub(crate) fn new(
        mode: Mode,
        axis: ControlledAxis,
        attitude: Shared<Attitude>,
        health: Shared<FilterHealth>,
        raw: Shared<ImuSample>,
        control: Shared<ControlTelemetry>,
    ) -> Self {
        Self {
            mode,
            axis,
            attitude,
            health,
            raw,
            control,
        }
    }

    pub fn attitude(&self) -> Attitude {
        self.attitude.snapshot()
    }

    pub fn control(&self) -> ControlTelemetry {
        self.control.snapshot()
    }

    pub fn health(&self) -> FilterHealth {
        self.health.snapshot()
    }

    /// Render the human-readable report for the current mode
    pub fn report(&self) -> String {
        match self.mode {
            Mode::RawSensor => {
                let s = self.raw.snapshot();
                format!(
                    "aX: {:.3} aY: {:.3} aZ: {:.3} gX: {:.3} gY: {:.3} gZ: {:.3}",
                    s.accel.x, s.accel.y, s.accel.z, s.gyro.x, s.gyro.y, s.gyro.z
                )
            }
            Mode::AttitudeOnly => angles_line(&self.attitude.snapshot()),
            Mode::Balance => self.balance_report(),
        }
    }

    fn balance_report(&self) -> String {
        let attitude = self.attitude.snapshot();
        let health = self.health.snapshot();
        let ctl = self.control.snapshot();
        let (axis_name, angle, rate) = match self.axis {
            ControlledAxis::Roll => ("Roll", attitude.roll, attitude.roll_rate),
            ControlledAxis::Pitch => ("Pitch", attitude.pitch, attitude.pitch_rate),
        };

        let mut out = String::new();
        let _ = writeln!(out, "{}", angles_line(&attitude));
        let _ = writeln!(
            out,
            "Motor duty: {}\t{}",
            ctl.command.channel1, ctl.command.channel2
        );
        let _ = writeln!(out, "{}:\t{:.2}\tGyro:\t{:.2}", axis_name, angle, rate);
        let _ = writeln!(out, "P:\t{:.3}", ctl.terms.p);
        let _ = writeln!(out, "I:\t{:.3}", ctl.terms.i);
        let _ = writeln!(out, "D:\t{:.3}", ctl.terms.d);
        let _ = writeln!(out, "Inner Cache:\t{:.3}", ctl.inner_last);
        let _ = writeln!(out, "Outter Cache:\t{:.3}", ctl.outer_last);
        let _ = writeln!(out, "Output:\t{:.3}", ctl.terms.output);
        let _ = write!(
            out,
            "State: {}  Saturations: {}  Accel rejections: {}  Resets: {}",
            ctl.arm_state, ctl.saturation_events, health.accel_rejections, health.resets
        );
        out
    }
}

fn angles_line(attitude: &Attitude) -> String {
    format!(
        "Pitch Angle: {:.2}; Roll Angle: {:.2}; Yaw Angle: {:.2}",
        attitude.pitch, attitude.roll, attitude.yaw
    )
}
