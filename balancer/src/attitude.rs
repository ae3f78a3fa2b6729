/// Published orientation snapshot read by the control and telemetry
/// activities.
///
/// Angles are in degrees (pitch in (-90°, 90°], roll and yaw in
/// (-180°, 180°]), body rates in degrees per second. Derived from the
/// estimator's quaternion every cycle; never written by a consumer.
#[derive(Default, Debug, Clone, Copy)]
pub struct Attitude {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,

    pub roll_rate: f32,
    pub pitch_rate: f32,
    pub yaw_rate: f32,
}
