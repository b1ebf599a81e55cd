//! Camera system

use glam::{Mat4, Quat, Vec3};

/// Perspective projection; the aspect ratio is supplied per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Projection {
            fov_y: std::f32::consts::FRAC_PI_4, // 45 degrees
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Projection {
    pub fn perspective(fov_y_degrees: f32, near: f32, far: f32) -> Self {
        Projection {
            fov_y: fov_y_degrees.to_radians(),
            near,
            far,
        }
    }

    /// Right-handed, depth in `[0, 1]`. Degenerate aspect ratios fall back to 1.
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }
}

/// Camera for viewing the sphere
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Kept at unit length after every update
    pub rotation: Quat,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 2.0), Projection::default())
    }
}

impl Camera {
    pub fn new(position: Vec3, projection: Projection) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            projection,
        }
    }

    /// World-to-view: inverse of the camera's rigid transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        self.projection.matrix(aspect)
    }

    /// World-to-clip matrix for a framebuffer of the given aspect ratio.
    pub fn ws_to_cs(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Get the forward direction
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the right direction
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Move by an offset expressed in the camera's local frame.
    pub fn translate_local(&mut self, offset: Vec3) {
        self.position += self.rotation * offset;
    }

    /// Pitch about the local X axis, then yaw about the local Y axis.
    pub fn rotate_local(&mut self, pitch: f32, yaw: f32) {
        let rotated = self.rotation * Quat::from_rotation_x(pitch) * Quat::from_rotation_y(yaw);
        self.rotation = rotated.normalize();
    }
}
