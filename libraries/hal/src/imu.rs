/// IMU (Inertial Measurement Unit) sensor interface
use crate::Vector3d;

/// IMU (Inertial Measurement Unit) interface
///
/// Implementations deliver one fresh six-axis reading per cycle. Units are
/// fixed by this interface: acceleration in m/s², angular rate in rad/s,
/// both in the body frame.
pub trait ImuSensor {
    /// Initialize the IMU sensor
    fn init(&mut self) -> bool;

    /// Get acceleration data (in m/s²)
    fn get_acceleration(&self) -> Vector3d;

    /// Get gyroscope data (in rad/s)
    fn get_gyro(&self) -> Vector3d;

    /// Check if the IMU sensor is healthy and operating correctly
    fn is_healthy(&self) -> bool;
}
