//! Physically based sphere viewer
//!
//! Shades a unit sphere with a Cook-Torrance point light and image-based
//! lighting read from two precomputed environment images:
//! - a diffuse irradiance map in latitude/longitude layout
//! - a specular atlas holding a chain of prefiltered copies, one per roughness band
//!
//! All lighting runs in linear space. Textures are stored and sampled
//! sRGB-encoded and decoded in the program; the final color is encoded
//! before it is written to a non-sRGB swapchain.
//!
//! [`renderer::FrameRenderer`] drives the GPU through the
//! [`backend::GraphicsBackend`] trait, [`shading`] holds the CPU reference of
//! the shading model, and [`viewer::Viewer`] wires everything to a window.

pub mod backend;
pub mod error;
pub mod panel;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod shader;
pub mod shading;
pub mod uniforms;
pub mod viewer;

use glam::Vec3;

pub use backend::wgpu_backend::WgpuBackend;
pub use error::{RenderError, RenderResult};
pub use renderer::{FrameRenderer, RendererState};
pub use scene::Scene;
pub use uniforms::FrameUniforms;
pub use viewer::Viewer;

/// Configuration for the renderer and the viewer window
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Enable vsync
    pub vsync: bool,
    /// Sphere tessellation around the equator
    pub sphere_segments: u32,
    /// Sphere tessellation from pole to pole
    pub sphere_rings: u32,
    /// Roughness bands in the specular atlas, terminal band excluded
    pub band_count: u32,
    /// Framebuffer clear color, written as is
    pub clear_color: [f32; 4],
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: Vec3,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            title: "PBR Sphere".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            sphere_segments: 64,
            sphere_rings: 32,
            band_count: shading::ibl::DEFAULT_BAND_COUNT,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            camera_position: Vec3::new(0.0, 0.0, 2.0),
        }
    }
}
