#![no_std]
extern crate nalgebra;

mod actuator;
mod imu;

pub use actuator::*;
pub use imu::*;
pub use nalgebra::Vector3;

/// 3D vector representation shared by all hardware interfaces
pub type Vector3d = Vector3<f32>;
