//! Per-frame uniform state
//!
//! [`FrameUniforms`] is rebuilt from the scene every frame and passed by value
//! into the draw. The program declares which names it reads; the renderer
//! checks them against this state before issuing the draw call.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::backend::TextureViewHandle;
use crate::resources::Material;
use crate::scene::{Camera, PointLight};

pub const MATERIAL_ALBEDO: &str = "material.albedo";
pub const MATERIAL_METALLIC: &str = "material.metallic";
pub const MATERIAL_ROUGHNESS: &str = "material.roughness";
pub const LIGHT_POSITION: &str = "light.position";
pub const LIGHT_COLOR: &str = "light.color";
pub const LIGHT_INTENSITY: &str = "light.intensity";
pub const CAMERA_WS_TO_CS: &str = "camera.ws_to_cs";
pub const CAMERA_POSITION: &str = "camera.position";
pub const ENVIRONMENT_DIFFUSE: &str = "environment.diffuse";
pub const ENVIRONMENT_SPECULAR: &str = "environment.specular";

/// Type of a named shader input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Scalar,
    Vec3,
    Mat4,
    Texture,
}

/// Value of a named shader input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Scalar(f32),
    Vec3(Vec3),
    Mat4(Mat4),
    Texture(TextureViewHandle),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Scalar(_) => UniformKind::Scalar,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
            UniformValue::Texture(_) => UniformKind::Texture,
        }
    }
}

/// Uploaded environment textures; a slot is `None` until fully uploaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvironmentBindings {
    pub diffuse: Option<TextureViewHandle>,
    pub specular: Option<TextureViewHandle>,
}

/// Complete uniform state for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUniforms {
    /// sRGB-encoded, normalized to [0, 1]
    pub material_albedo: Vec3,
    pub material_metallic: f32,
    pub material_roughness: f32,
    pub light_position: Vec3,
    pub light_color: Vec3,
    pub light_intensity: f32,
    pub camera_ws_to_cs: Mat4,
    pub camera_position: Vec3,
    pub environment: EnvironmentBindings,
}

impl FrameUniforms {
    /// Snapshot the scene for a framebuffer with the given aspect ratio.
    pub fn build(
        camera: &Camera,
        light: &PointLight,
        material: &Material,
        aspect: f32,
        environment: EnvironmentBindings,
    ) -> Self {
        Self {
            material_albedo: material.albedo,
            material_metallic: material.metallic,
            material_roughness: material.roughness,
            light_position: light.position,
            light_color: light.color,
            light_intensity: light.intensity,
            camera_ws_to_cs: camera.ws_to_cs(aspect),
            camera_position: camera.position,
            environment,
        }
    }

    /// Look up a uniform by its shader-facing name.
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        let value = match name {
            MATERIAL_ALBEDO => UniformValue::Vec3(self.material_albedo),
            MATERIAL_METALLIC => UniformValue::Scalar(self.material_metallic),
            MATERIAL_ROUGHNESS => UniformValue::Scalar(self.material_roughness),
            LIGHT_POSITION => UniformValue::Vec3(self.light_position),
            LIGHT_COLOR => UniformValue::Vec3(self.light_color),
            LIGHT_INTENSITY => UniformValue::Scalar(self.light_intensity),
            CAMERA_WS_TO_CS => UniformValue::Mat4(self.camera_ws_to_cs),
            CAMERA_POSITION => UniformValue::Vec3(self.camera_position),
            ENVIRONMENT_DIFFUSE => UniformValue::Texture(self.environment.diffuse?),
            ENVIRONMENT_SPECULAR => UniformValue::Texture(self.environment.specular?),
            _ => return None,
        };
        Some(value)
    }

    /// Every uniform currently present, in declaration order.
    pub fn entries(&self) -> Vec<(&'static str, UniformValue)> {
        [
            MATERIAL_ALBEDO,
            MATERIAL_METALLIC,
            MATERIAL_ROUGHNESS,
            LIGHT_POSITION,
            LIGHT_COLOR,
            LIGHT_INTENSITY,
            CAMERA_WS_TO_CS,
            CAMERA_POSITION,
            ENVIRONMENT_DIFFUSE,
            ENVIRONMENT_SPECULAR,
        ]
        .into_iter()
        .filter_map(|name| self.get(name).map(|value| (name, value)))
        .collect()
    }

    /// Pack the non-texture uniforms into the layout of the WGSL `SceneUniforms` struct.
    pub fn gpu_data(&self) -> SceneUniformData {
        SceneUniformData {
            ws_to_cs: self.camera_ws_to_cs,
            camera_position: self.camera_position.extend(1.0),
            light_position: self.light_position.extend(1.0),
            light_color_intensity: self.light_color.extend(self.light_intensity),
            albedo_metallic: self.material_albedo.extend(self.material_metallic),
            material_params: Vec4::new(self.material_roughness, 0.0, 0.0, 0.0),
        }
    }
}

/// GPU layout of the scene uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniformData {
    pub ws_to_cs: Mat4,
    pub camera_position: Vec4,
    pub light_position: Vec4,
    /// rgb = color, w = intensity
    pub light_color_intensity: Vec4,
    /// rgb = sRGB albedo, w = metallic
    pub albedo_metallic: Vec4,
    /// x = roughness
    pub material_params: Vec4,
}

impl SceneUniformData {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}
