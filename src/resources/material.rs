//! Material definition for PBR shading

use glam::Vec3;

use crate::shading::color_space::srgb_to_linear_rgb;

/// PBR material properties
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// sRGB-encoded albedo normalized to `[0, 1]`; decoded in the shader
    pub albedo: Vec3,
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vec3::ONE,
            metallic: 0.0,
            roughness: 0.5,
        }
    }
}

impl Material {
    /// Albedo from 8-bit sRGB channels.
    pub fn from_srgb8(rgb: [u8; 3]) -> Self {
        Self {
            albedo: Vec3::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32) / 255.0,
            ..Default::default()
        }
    }

    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = clamp_unit(metallic);
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = clamp_unit(roughness);
        self
    }

    /// Albedo as used by the lighting math.
    pub fn linear_albedo(&self) -> Vec3 {
        srgb_to_linear_rgb(self.albedo)
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
