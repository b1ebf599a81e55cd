//! The single point light illuminating the sphere

use glam::Vec3;

/// Point light
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    /// Normalized RGB. Carried to the program but not applied to the direct term.
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 2.0),
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            position,
            color,
            intensity: intensity.max(0.0),
        }
    }

    /// Position in the plane `z = 2` from a pair of 0-255 pad coordinates.
    pub fn position_from_pad(coordinate: [u8; 2]) -> Vec3 {
        let axis = |c: u8| (c as f32 / 255.0 - 0.5) * 2.0;
        Vec3::new(axis(coordinate[0]), axis(coordinate[1]), 2.0)
    }
}
