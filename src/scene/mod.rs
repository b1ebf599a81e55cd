//! Scene state: one camera, one point light, one material

mod camera;
mod camera_controller;
mod controls;
mod light;

pub use camera::*;
pub use camera_controller::*;
pub use controls::*;
pub use light::*;

use crate::resources::Material;
use crate::RendererConfig;

/// Everything a frame's uniforms are built from
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub camera: Camera,
    pub light: PointLight,
    pub material: Material,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(&RendererConfig::default())
    }
}

impl Scene {
    pub fn new(config: &RendererConfig) -> Self {
        let mut scene = Self {
            camera: Camera::new(
                config.camera_position,
                Projection::perspective(config.fov_y_degrees, config.near, config.far),
            ),
            light: PointLight::default(),
            material: Material::default(),
        };
        scene.apply_controls(&ControlState::default());
        scene
    }

    /// Pull the panel snapshot into the light and material.
    pub fn apply_controls(&mut self, controls: &ControlState) {
        controls.apply(&mut self.material, &mut self.light);
    }
}
