//! Environment maps for image-based lighting

use std::path::Path;

use glam::{Vec2, Vec4};

use super::texture::{TextureData, TextureError};
use crate::backend::types::{AddressMode, FilterMode, SamplerDescriptor};
use crate::shading::ibl::EnvironmentSampler;

/// Which environment map a texture feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentSlot {
    /// Irradiance map, looked up along the normal
    Diffuse,
    /// Roughness band atlas, looked up along the reflection
    Specular,
}

impl EnvironmentSlot {
    pub const ALL: [EnvironmentSlot; 2] = [EnvironmentSlot::Diffuse, EnvironmentSlot::Specular];

    pub fn label(&self) -> &'static str {
        match self {
            EnvironmentSlot::Diffuse => "environment.diffuse",
            EnvironmentSlot::Specular => "environment.specular",
        }
    }

    /// Address modes per slot: the diffuse map wraps around the azimuth seam,
    /// the atlas clamps at the image border. Band edges inside the atlas are
    /// handled by the lookup itself, see [`crate::shading::ibl::BandRect::atlas_uv`].
    pub fn address_modes(&self) -> (AddressMode, AddressMode) {
        match self {
            EnvironmentSlot::Diffuse => (AddressMode::Repeat, AddressMode::ClampToEdge),
            EnvironmentSlot::Specular => (AddressMode::ClampToEdge, AddressMode::ClampToEdge),
        }
    }

    pub fn sampler_descriptor(&self) -> SamplerDescriptor {
        let (address_mode_u, address_mode_v) = self.address_modes();
        SamplerDescriptor {
            label: Some(format!("{} sampler", self.label())),
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            address_mode_u,
            address_mode_v,
        }
    }
}

/// CPU-side copy of an environment map with bilinear filtering
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentImage {
    texture: TextureData,
    address_u: AddressMode,
    address_v: AddressMode,
}

impl EnvironmentImage {
    pub fn new(texture: TextureData, slot: EnvironmentSlot) -> Self {
        let (address_u, address_v) = slot.address_modes();
        Self {
            texture,
            address_u,
            address_v,
        }
    }

    pub fn texture(&self) -> &TextureData {
        &self.texture
    }

    fn fetch(&self, x: i64, y: i64) -> Vec4 {
        let x = self.address_u.resolve(x, self.texture.width);
        let y = self.address_v.resolve(y, self.texture.height);
        let [r, g, b, a] = self.texture.texel(x, y);
        Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
    }
}

impl EnvironmentSampler for EnvironmentImage {
    fn sample(&self, uv: Vec2) -> Vec4 {
        let x = uv.x * self.texture.width as f32 - 0.5;
        let y = uv.y * self.texture.height as f32 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.fetch(x0, y0).lerp(self.fetch(x0 + 1, y0), fx);
        let bottom = self.fetch(x0, y0 + 1).lerp(self.fetch(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }

    fn texel_size(&self) -> Option<Vec2> {
        Some(Vec2::new(
            1.0 / self.texture.width.max(1) as f32,
            1.0 / self.texture.height.max(1) as f32,
        ))
    }
}

/// Decoded environment textures handed to the renderer; a slot is either
/// fully loaded or absent.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentSources {
    pub diffuse: Option<TextureData>,
    pub specular: Option<TextureData>,
}

impl EnvironmentSources {
    /// Best-effort load; a failing file leaves its slot empty.
    pub fn load(diffuse: Option<&Path>, specular: Option<&Path>) -> Self {
        Self {
            diffuse: diffuse.and_then(|path| load_slot(EnvironmentSlot::Diffuse, path)),
            specular: specular.and_then(|path| load_slot(EnvironmentSlot::Specular, path)),
        }
    }

    pub fn get(&self, slot: EnvironmentSlot) -> Option<&TextureData> {
        match slot {
            EnvironmentSlot::Diffuse => self.diffuse.as_ref(),
            EnvironmentSlot::Specular => self.specular.as_ref(),
        }
    }
}

fn load_slot(slot: EnvironmentSlot, path: &Path) -> Option<TextureData> {
    match TextureData::from_file(path) {
        Ok(texture) => {
            log::info!(
                "Loaded {} from {} ({}x{})",
                slot.label(),
                path.display(),
                texture.width,
                texture.height
            );
            Some(texture)
        }
        Err(e) => {
            log_load_failure(slot, &e);
            None
        }
    }
}

fn log_load_failure(slot: EnvironmentSlot, error: &TextureError) {
    log::warn!("{} unavailable, continuing without it: {}", slot.label(), error);
}
