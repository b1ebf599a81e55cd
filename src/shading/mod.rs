//! CPU reference of the fragment shading model.
//!
//! The GPU program in [`crate::shader`] is generated from the same constants;
//! this module is what the tests check numbers against.

pub mod brdf;
pub mod color_space;
pub mod equirect;
pub mod ibl;

use glam::{Vec3, Vec4};

use crate::uniforms::FrameUniforms;
use brdf::{evaluate_direct, reflect, safe_normalize, LightingGeometry, SurfaceSample};
use ibl::{EnvironmentSampler, RoughnessBands};

pub use brdf::DirectLighting;

/// Interpolated vertex outputs for one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub world_position: Vec3,
    pub world_normal: Vec3,
    pub view_direction: Vec3,
}

impl Fragment {
    /// What the vertex stage emits for a sphere vertex: object space is world space.
    pub fn from_vertex(position: Vec3, normal: Vec3, camera_position: Vec3) -> Self {
        Self {
            world_position: position,
            world_normal: normal,
            view_direction: camera_position - position,
        }
    }
}

/// Environment maps available to a program, as chosen when it was built.
#[derive(Clone, Copy)]
pub struct ShadingEnvironment<'a> {
    pub diffuse: Option<&'a dyn EnvironmentSampler>,
    pub specular: Option<&'a dyn EnvironmentSampler>,
    pub bands: &'a RoughnessBands,
}

impl<'a> ShadingEnvironment<'a> {
    /// Point light only.
    pub fn analytic(bands: &'a RoughnessBands) -> Self {
        Self {
            diffuse: None,
            specular: None,
            bands,
        }
    }
}

/// Breakdown of the linear irradiance leaving one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedFragment {
    pub direct: DirectLighting,
    pub diffuse_indirect: Vec3,
    pub specular_indirect: Vec3,
}

impl ShadedFragment {
    pub fn total(&self) -> Vec3 {
        self.direct.radiance + self.diffuse_indirect + self.specular_indirect
    }
}

/// Shade one fragment in linear space.
pub fn shade_fragment(
    fragment: &Fragment,
    uniforms: &FrameUniforms,
    environment: &ShadingEnvironment<'_>,
) -> ShadedFragment {
    let n = safe_normalize(fragment.world_normal, Vec3::Z);
    let v = safe_normalize(fragment.view_direction, n);
    let l = safe_normalize(uniforms.light_position - fragment.world_position, n);
    let geometry = LightingGeometry::new(n, v, l);

    let surface = SurfaceSample {
        albedo: color_space::srgb_to_linear_rgb(uniforms.material_albedo),
        metallic: uniforms.material_metallic,
        roughness: uniforms.material_roughness,
    };
    let direct = evaluate_direct(&geometry, &surface, uniforms.light_intensity);

    let diffuse_indirect = environment
        .diffuse
        .map(|map| direct.k_d * surface.albedo * ibl::diffuse_irradiance(map, n))
        .unwrap_or(Vec3::ZERO);

    let specular_indirect = environment
        .specular
        .map(|atlas| {
            let r = reflect(-v, n);
            direct.k_s * ibl::specular_radiance(atlas, environment.bands, r, surface.roughness)
        })
        .unwrap_or(Vec3::ZERO);

    ShadedFragment {
        direct,
        diffuse_indirect,
        specular_indirect,
    }
}

/// Shade one fragment and encode it the way the program writes the framebuffer.
pub fn shade_pixel(
    fragment: &Fragment,
    uniforms: &FrameUniforms,
    environment: &ShadingEnvironment<'_>,
) -> Vec4 {
    let total = shade_fragment(fragment, uniforms, environment).total();
    color_space::linear_to_srgb(total.extend(1.0))
}
