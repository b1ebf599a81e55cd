//! Values edited through the parameter panel.

use glam::Vec3;

use super::PointLight;
use crate::resources::Material;

/// Snapshot of the panel's widgets, read once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    /// sRGB-encoded albedo
    pub albedo: [u8; 3],
    /// Light pad coordinate, mapped onto the `z = 2` plane
    pub light_coordinate: [u8; 2],
    pub metallic: f32,
    pub roughness: f32,
    pub light_strength: f32,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            albedo: [255, 255, 255],
            light_coordinate: [0, 0],
            metallic: 0.0,
            roughness: 0.5,
            light_strength: 1.0,
        }
    }
}

impl ControlState {
    pub const MAX_LIGHT_STRENGTH: f32 = 5.0;

    pub fn light_position(&self) -> Vec3 {
        PointLight::position_from_pad(self.light_coordinate)
    }

    /// Copy the snapshot into the scene, clamping sliders to their ranges.
    pub fn apply(&self, material: &mut Material, light: &mut PointLight) {
        *material = Material::from_srgb8(self.albedo)
            .with_metallic(self.metallic)
            .with_roughness(self.roughness);
        light.position = self.light_position();
        light.intensity = self.light_strength.clamp(0.0, Self::MAX_LIGHT_STRENGTH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_initial_panel() {
        let controls = ControlState::default();
        let mut material = Material::default();
        let mut light = PointLight::default();
        controls.apply(&mut material, &mut light);

        assert_eq!(material.albedo, Vec3::ONE);
        assert_eq!(material.metallic, 0.0);
        assert_eq!(material.roughness, 0.5);
        assert_eq!(light.position, Vec3::new(-1.0, -1.0, 2.0));
        assert_eq!(light.intensity, 1.0);
    }

    #[test]
    fn sliders_are_clamped() {
        let controls = ControlState {
            metallic: 2.0,
            roughness: -1.0,
            light_strength: 9.0,
            ..ControlState::default()
        };
        let mut material = Material::default();
        let mut light = PointLight::default();
        controls.apply(&mut material, &mut light);

        assert_eq!(material.metallic, 1.0);
        assert_eq!(material.roughness, 0.0);
        assert_eq!(light.intensity, ControlState::MAX_LIGHT_STRENGTH);
    }
}
