//! Orbital camera derived from the simulation parameters

use crate::params::SimulationParameters;
use glam::Vec3;

/// Forward direction used when the camera sits exactly on the origin
pub const FALLBACK_FORWARD: Vec3 = Vec3::NEG_Z;

/// Camera on a sphere around the origin, always looking at it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    /// Camera position in world space
    pub position: Vec3,
    /// Unit view direction
    pub direction: Vec3,
    /// World up axis; the kernel re-orthogonalizes it
    pub up: Vec3,
}

impl CameraFrame {
    /// Place the camera at `distance` with the given pitch and yaw
    pub fn orbit(distance: f32, pitch: f32, yaw: f32) -> Self {
        let (sin_x, cos_x) = pitch.sin_cos();
        let (sin_y, cos_y) = yaw.sin_cos();
        let position = distance * Vec3::new(cos_y * cos_x, sin_x, sin_y * cos_x);

        // A zero (or non-finite) offset has no direction to normalize
        let direction = (-position).try_normalize().unwrap_or(FALLBACK_FORWARD);

        Self {
            position,
            direction,
            up: Vec3::Y,
        }
    }

    /// Camera frame for a parameter snapshot
    pub fn from_parameters(params: &SimulationParameters) -> Self {
        Self::orbit(
            params.camera_distance,
            params.camera_angle_x,
            params.camera_angle_y,
        )
    }
}
