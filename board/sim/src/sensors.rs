use std::f32::consts::TAU;

use hal::{ImuSensor, Vector3d};

const GRAVITY: f32 = 9.81;

/// Bench-rock IMU simulation.
///
/// The simulated body oscillates slowly about the roll axis; the reported
/// acceleration is the gravity vector expressed in the rocking body frame
/// and the gyro reports the matching analytic roll rate. Deterministic, so
/// runs are reproducible.
pub struct SimImu {
    initialized: bool,
    sample_period: f32,
    cycle: u64,
    amplitude: f32,
    frequency: f32,
    theta: f32,
    omega: f32,
}

impl SimImu {
    pub fn new(sample_period: f32) -> Self {
        Self {
            initialized: false,
            sample_period,
            cycle: 0,
            amplitude: 0.35, // rad, ~20° of rock
            frequency: 0.5,  // Hz
            theta: 0.0,
            omega: 0.0,
        }
    }

    /// Advance the simulated motion by one sample period
    pub fn advance(&mut self) {
        self.cycle += 1;
        let t = self.cycle as f32 * self.sample_period;
        let w = TAU * self.frequency;
        self.theta = self.amplitude * (w * t).sin();
        self.omega = self.amplitude * w * (w * t).cos();
    }
}

impl ImuSensor for SimImu {
    fn init(&mut self) -> bool {
        self.initialized = true;
        true
    }

    fn get_acceleration(&self) -> Vector3d {
        Vector3d::new(0.0, GRAVITY * self.theta.sin(), GRAVITY * self.theta.cos())
    }

    fn get_gyro(&self) -> Vector3d {
        Vector3d::new(self.omega, 0.0, 0.0)
    }

    fn is_healthy(&self) -> bool {
        self.initialized
    }
}
