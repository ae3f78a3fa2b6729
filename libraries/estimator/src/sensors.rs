use nalgebra as na;

/// One six-axis inertial sample consumed by the filter
///
/// Produced fresh every estimator cycle by the IMU collaborator; carries no
/// identity and is never stored.
#[derive(Debug, Clone, Copy)]
pub struct ImuSample {
    /// Accelerometer measurement in body frame (x, y, z) in m/s²
    pub accel: na::Vector3<f32>,

    /// Gyroscope measurement in body frame (x, y, z) in rad/s
    pub gyro: na::Vector3<f32>,
}

impl Default for ImuSample {
    fn default() -> Self {
        Self {
            accel: na::Vector3::zeros(),
            gyro: na::Vector3::zeros(),
        }
    }
}

impl ImuSample {
    pub fn new(accel: na::Vector3<f32>, gyro: na::Vector3<f32>) -> Self {
        Self { accel, gyro }
    }

    /// True when every component is a usable finite number
    pub fn is_finite(&self) -> bool {
        self.accel.iter().all(|v| v.is_finite()) && self.gyro.iter().all(|v| v.is_finite())
    }
}
