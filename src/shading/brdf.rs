//! Cook-Torrance specular with a Lambertian diffuse lobe.

use glam::Vec3;
use std::f32::consts::PI;

/// Reflectance at normal incidence, used for every material.
pub const DIELECTRIC_F0: Vec3 = Vec3::splat(0.04);

/// Floor for the cosine terms in the specular denominator.
pub const COSINE_EPSILON: f32 = 1e-5;

const NORMALIZE_EPSILON: f32 = 1e-10;

/// Normalize `v`, or return `fallback` when `v` has (near) zero length.
pub fn safe_normalize(v: Vec3, fallback: Vec3) -> Vec3 {
    let length_squared = v.length_squared();
    if length_squared < NORMALIZE_EPSILON || !length_squared.is_finite() {
        fallback
    } else {
        v / length_squared.sqrt()
    }
}

/// Mirror `incident` about the unit normal `n`.
pub fn reflect(incident: Vec3, n: Vec3) -> Vec3 {
    incident - 2.0 * n.dot(incident) * n
}

/// Fresnel-Schlick approximation.
pub fn fresnel_schlick(f0: Vec3, h: Vec3, l: Vec3) -> Vec3 {
    let falloff = (1.0 - h.dot(l)).clamp(0.0, 1.0).powi(5);
    f0 + (Vec3::ONE - f0) * falloff
}

/// GGX / Trowbridge-Reitz normal distribution with `a = roughness`.
///
/// A perfect mirror (`roughness == 0`) evaluates to zero instead of `0 / 0`.
pub fn distribution_ggx(n: Vec3, h: Vec3, roughness: f32) -> f32 {
    let a2 = roughness * roughness;
    let n_dot_h = n.dot(h).max(0.0);
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom).max(f32::MIN_POSITIVE)
}

fn geometry_schlick_ggx(n_dot_x: f32, k: f32) -> f32 {
    n_dot_x / (n_dot_x * (1.0 - k) + k)
}

/// Smith shadowing-masking with the Schlick-GGX term for direct lighting.
pub fn geometry_smith(n: Vec3, v: Vec3, l: Vec3, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = r * r / 8.0;
    geometry_schlick_ggx(n.dot(v).max(0.0), k) * geometry_schlick_ggx(n.dot(l).max(0.0), k)
}

/// Unit vectors describing one shading point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingGeometry {
    pub n: Vec3,
    pub v: Vec3,
    pub l: Vec3,
    pub h: Vec3,
}

impl LightingGeometry {
    /// Builds the half vector from already normalized inputs.
    pub fn new(n: Vec3, v: Vec3, l: Vec3) -> Self {
        Self {
            n,
            v,
            l,
            h: safe_normalize(l + v, n),
        }
    }

    pub fn n_dot_l(&self) -> f32 {
        self.n.dot(self.l)
    }

    pub fn n_dot_v(&self) -> f32 {
        self.n.dot(self.v)
    }
}

/// Material inputs after color decoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub albedo: Vec3,
    pub metallic: f32,
    pub roughness: f32,
}

/// Terms of the direct lighting evaluation, kept apart for the indirect pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectLighting {
    /// Fresnel reflectance, doubling as the specular weight.
    pub k_s: Vec3,
    /// Diffuse weight `(1 - kS)(1 - metallic)`.
    pub k_d: Vec3,
    pub specular: Vec3,
    pub diffuse: Vec3,
    /// `(diffuse + specular) * intensity * max(n.l, 0)`
    pub radiance: Vec3,
}

pub fn evaluate_direct(
    geometry: &LightingGeometry,
    surface: &SurfaceSample,
    intensity: f32,
) -> DirectLighting {
    let LightingGeometry { n, v, l, h } = *geometry;

    let k_s = fresnel_schlick(DIELECTRIC_F0, h, l);
    let k_d = (Vec3::ONE - k_s) * (1.0 - surface.metallic);

    let d = distribution_ggx(n, h, surface.roughness);
    let g = geometry_smith(n, v, l, surface.roughness);
    let specular = k_s * g * d
        / (4.0 * geometry.n_dot_v().max(COSINE_EPSILON) * geometry.n_dot_l().max(COSINE_EPSILON));
    let diffuse = k_d * surface.albedo / PI;

    DirectLighting {
        k_s,
        k_d,
        specular,
        diffuse,
        radiance: (diffuse + specular) * intensity * geometry.n_dot_l().max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn head_on() -> LightingGeometry {
        LightingGeometry::new(Vec3::Z, Vec3::Z, Vec3::Z)
    }

    #[test]
    fn head_on_terms() {
        let g = head_on();
        assert_eq!(g.h, Vec3::Z);
        assert_abs_diff_eq!(fresnel_schlick(DIELECTRIC_F0, g.h, g.l).x, 0.04, epsilon = 1e-6);
        assert_abs_diff_eq!(distribution_ggx(g.n, g.h, 0.5), 4.0 / PI, epsilon = 1e-5);
        assert_abs_diff_eq!(geometry_smith(g.n, g.v, g.l, 0.5), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn metallic_surfaces_have_no_diffuse() {
        let surface = SurfaceSample {
            albedo: Vec3::ONE,
            metallic: 1.0,
            roughness: 0.3,
        };
        let lit = evaluate_direct(&head_on(), &surface, 1.0);
        assert_eq!(lit.diffuse, Vec3::ZERO);
        assert!(lit.specular.x > 0.0);
    }

    #[rstest]
    #[case::smooth(0.0)]
    #[case::mid(0.5)]
    #[case::rough(1.0)]
    fn specular_is_non_negative(#[case] roughness: f32) {
        let surface = SurfaceSample {
            albedo: Vec3::splat(0.5),
            metallic: 0.0,
            roughness,
        };
        let directions = [
            Vec3::new(0.3, 0.2, 0.9),
            Vec3::new(-0.7, 0.1, 0.2),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.001),
        ];
        for v in directions {
            for l in directions {
                let geometry = LightingGeometry::new(Vec3::Z, v.normalize(), l.normalize());
                let lit = evaluate_direct(&geometry, &surface, 1.0);
                assert!(lit.specular.min_element() >= 0.0, "{:?}", lit);
                assert!(lit.radiance.is_finite());
            }
        }
    }

    #[test]
    fn light_behind_surface_contributes_nothing() {
        let geometry = LightingGeometry::new(Vec3::Z, Vec3::Z, -Vec3::Z);
        let surface = SurfaceSample {
            albedo: Vec3::ONE,
            metallic: 0.0,
            roughness: 0.5,
        };
        assert_eq!(evaluate_direct(&geometry, &surface, 3.0).radiance, Vec3::ZERO);
    }

    #[test]
    fn mirror_distribution_is_finite() {
        assert_eq!(distribution_ggx(Vec3::Z, Vec3::Z, 0.0), 0.0);
    }

    #[test]
    fn zero_length_vectors_fall_back() {
        assert_eq!(safe_normalize(Vec3::ZERO, Vec3::Y), Vec3::Y);
        assert_eq!(safe_normalize(Vec3::new(0.0, 0.0, 2.0), Vec3::Y), Vec3::Z);
    }
}
