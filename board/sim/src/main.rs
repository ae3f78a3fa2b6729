use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use log::{error, info};

use balancer::{BalancerConfig, FaultReason, Mode, Vehicle};
use estimator::ImuSample;
use hal::{BalanceActuator, ImuSensor};

mod actuator;
mod runner;
mod sensors;

use actuator::SimActuator;
use runner::{spawn_periodic, DeadlineAlarm};
use sensors::SimImu;

/// Seconds the bench run keeps the pipeline alive before shutting down
const RUN_SECONDS: u64 = 5;

/// Milliseconds the estimator gets to settle onto gravity before arming
const SETTLE_MS: u64 = 300;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mode = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<Mode>().map_err(anyhow::Error::msg)?,
        None => Mode::default(),
    };

    let mut actuator_hw = SimActuator::new();
    if !actuator_hw.init() {
        bail!("actuator failed to initialize");
    }

    let config = BalancerConfig {
        mode,
        actuator_range: actuator_hw.range(),
        ..BalancerConfig::default()
    };
    let vehicle = Vehicle::new(config).context("invalid vehicle configuration")?;

    let mut imu = SimImu::new(config.filter.sample_period);
    info!("Config IMU...");
    if !imu.init() || !imu.is_healthy() {
        bail!("IMU failed to initialize");
    }
    info!("IMU connect success, running in {:?} mode", mode);

    let (mut attitude_stage, mut control_stage, telemetry) = vehicle.split();

    let stop = Arc::new(AtomicBool::new(false));
    let alarm = Arc::new(DeadlineAlarm::default());

    let estimator_task = spawn_periodic(
        "estimator",
        config.estimator_period(),
        stop.clone(),
        alarm.clone(),
        config.max_consecutive_overruns,
        move || {
            imu.advance();
            let sample = ImuSample::new(imu.get_acceleration(), imu.get_gyro());
            attitude_stage.step(&sample);
        },
    )
    .context("failed to spawn estimator task")?;

    if mode == Mode::Balance {
        // Let the filter settle onto the gravity reference before the
        // actuator goes live.
        thread::sleep(Duration::from_millis(SETTLE_MS));
        control_stage.arm().context("arming failed")?;
        info!("armed");
    }

    let control_alarm = alarm.clone();
    let control_task = spawn_periodic(
        "control",
        config.control_period,
        stop.clone(),
        alarm.clone(),
        config.max_consecutive_overruns,
        move || {
            if control_alarm.is_tripped() {
                control_stage.fault(FaultReason::DeadlineMiss);
            }
            let command = control_stage.step();
            actuator_hw.write(command.channel1, command.channel2);
        },
    )
    .context("failed to spawn control task")?;

    let telemetry_task = spawn_periodic(
        "telemetry",
        config.telemetry_period,
        stop.clone(),
        alarm.clone(),
        0,
        move || {
            info!("\n{}", telemetry.report());
        },
    )
    .context("failed to spawn telemetry task")?;

    thread::sleep(Duration::from_secs(RUN_SECONDS));
    info!("stopping");
    stop.store(true, Ordering::Relaxed);

    for task in [estimator_task, control_task, telemetry_task] {
        if task.join().is_err() {
            error!("a periodic task panicked during shutdown");
        }
    }
    info!("shutdown complete");
    Ok(())
}
