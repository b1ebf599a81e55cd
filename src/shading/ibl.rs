//! Image-based lighting lookups.
//!
//! The specular environment is one 2D atlas holding a chain of progressively
//! blurrier copies of the environment, one per roughness band. Band `k`
//! (for `k < N`) sits below all earlier bands with height `1/2^(k+1)` and
//! width `1/2^k`; the terminal band `N` reuses the footprint of band `N - 1`
//! and fills the rest of the image.

use glam::{Vec2, Vec3, Vec4};

use super::color_space::srgb_to_linear;
use super::equirect::{direction_to_uv, texel_uv};

/// Number of roughness bands when nothing else is configured.
pub const DEFAULT_BAND_COUNT: u32 = 5;
/// Deepest chain supported; beyond this the rectangles drop below a texel.
pub const MAX_BAND_COUNT: u32 = 12;

/// Placement of one band inside the atlas, in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandRect {
    pub vertical_offset: f32,
    pub horizontal_scale: f32,
    pub vertical_scale: f32,
}

impl BandRect {
    /// Map an equirect `(u, v)` into this rectangle of the atlas image.
    ///
    /// The result is kept `half_texel` away from every edge of the rectangle,
    /// so a bilinear fetch never reaches a neighbouring band or the unused
    /// area to the right of the band.
    pub fn atlas_uv(&self, uv: Vec2, half_texel: Vec2) -> Vec2 {
        let texel = texel_uv(uv);
        Vec2::new(
            inset(texel.x * self.horizontal_scale, 0.0, self.horizontal_scale, half_texel.x),
            inset(
                self.vertical_offset + texel.y * self.vertical_scale,
                self.vertical_offset,
                self.vertical_scale,
                half_texel.y,
            ),
        )
    }
}

/// Clamp `value` into `[start + half, start + extent - half]`; a span narrower
/// than one texel collapses to its center.
fn inset(value: f32, start: f32, extent: f32, half: f32) -> f32 {
    if extent <= 2.0 * half {
        start + 0.5 * extent
    } else {
        value.clamp(start + half, start + extent - half)
    }
}

/// The two bands to sample for a roughness value and the weight of the upper one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSelection {
    pub lower: usize,
    pub upper: usize,
    pub blend: f32,
}

/// Table of band rectangles for a chain of `N` bands plus the terminal band.
#[derive(Debug, Clone, PartialEq)]
pub struct RoughnessBands {
    rects: Vec<BandRect>,
}

impl Default for RoughnessBands {
    fn default() -> Self {
        Self::new(DEFAULT_BAND_COUNT)
    }
}

impl RoughnessBands {
    /// Build the table; `band_count` is clamped to `1..=MAX_BAND_COUNT`.
    pub fn new(band_count: u32) -> Self {
        let count = band_count.clamp(1, MAX_BAND_COUNT);
        if count != band_count {
            log::warn!(
                "Roughness band count {} out of range, using {}",
                band_count,
                count
            );
        }

        let mut rects: Vec<BandRect> = (0..count)
            .map(|k| {
                let size = 0.5_f32.powi(k as i32);
                BandRect {
                    vertical_offset: 1.0 - size,
                    horizontal_scale: size,
                    vertical_scale: size * 0.5,
                }
            })
            .collect();

        let tail = 0.5_f32.powi(count as i32);
        rects.push(BandRect {
            vertical_offset: 1.0 - tail,
            horizontal_scale: tail * 2.0,
            vertical_scale: tail,
        });

        Self { rects }
    }

    /// `N`, the number of bands below the terminal one.
    pub fn band_count(&self) -> u32 {
        (self.rects.len() - 1) as u32
    }

    /// All rectangles, terminal band last.
    pub fn rects(&self) -> &[BandRect] {
        &self.rects
    }

    pub fn rect(&self, band: usize) -> BandRect {
        self.rects[band.min(self.rects.len() - 1)]
    }

    pub fn select(&self, roughness: f32) -> BandSelection {
        let n = self.band_count();
        let scaled = if roughness.is_nan() {
            0.0
        } else {
            roughness.clamp(0.0, 1.0) * n as f32
        };
        let lower = (scaled.floor() as u32).min(n - 1);
        BandSelection {
            lower: lower as usize,
            upper: lower as usize + 1,
            blend: (scaled - lower as f32).clamp(0.0, 1.0),
        }
    }
}

/// Something an environment lookup can read from.
///
/// `uv` is in image space (row 0 at the top); the result is the stored
/// sRGB-encoded RGBA in `[0, 1]`.
pub trait EnvironmentSampler {
    fn sample(&self, uv: Vec2) -> Vec4;

    /// Size of one texel in `uv` units, when the source is a discrete image.
    fn texel_size(&self) -> Option<Vec2> {
        None
    }
}

impl<F> EnvironmentSampler for F
where
    F: Fn(Vec2) -> Vec4,
{
    fn sample(&self, uv: Vec2) -> Vec4 {
        self(uv)
    }
}

/// Decode a stored texel and fold alpha in as an intensity multiplier.
pub fn decode_texel(texel: Vec4) -> Vec3 {
    let linear = srgb_to_linear(texel);
    linear.truncate() * linear.w
}

/// Irradiance arriving along normal `n` from the diffuse environment map.
pub fn diffuse_irradiance(map: &dyn EnvironmentSampler, n: Vec3) -> Vec3 {
    decode_texel(map.sample(texel_uv(direction_to_uv(n))))
}

/// Prefiltered radiance along reflection direction `r`, blended between bands.
pub fn specular_radiance(
    atlas: &dyn EnvironmentSampler,
    bands: &RoughnessBands,
    r: Vec3,
    roughness: f32,
) -> Vec3 {
    let uv = direction_to_uv(r);
    let half_texel = atlas.texel_size().map_or(Vec2::ZERO, |size| size * 0.5);
    let selection = bands.select(roughness);
    let lower = decode_texel(atlas.sample(bands.rect(selection.lower).atlas_uv(uv, half_texel)));
    let upper = decode_texel(atlas.sample(bands.rect(selection.upper).atlas_uv(uv, half_texel)));
    lower.lerp(upper, selection.blend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn default_table_has_terminal_band() {
        let bands = RoughnessBands::default();
        assert_eq!(bands.band_count(), 5);
        assert_eq!(bands.rects().len(), 6);
        assert_eq!(
            bands.rect(0),
            BandRect {
                vertical_offset: 0.0,
                horizontal_scale: 1.0,
                vertical_scale: 0.5
            }
        );
        assert_eq!(
            bands.rect(5),
            BandRect {
                vertical_offset: 1.0 - 1.0 / 32.0,
                horizontal_scale: 1.0 / 16.0,
                vertical_scale: 1.0 / 32.0
            }
        );
    }

    #[test]
    fn bands_tile_the_image_vertically() {
        let bands = RoughnessBands::default();
        for pair in bands.rects()[..5].windows(2) {
            assert_abs_diff_eq!(
                pair[0].vertical_offset + pair[0].vertical_scale,
                pair[1].vertical_offset,
                epsilon = 1e-7
            );
        }
        let last = bands.rect(5);
        assert_abs_diff_eq!(last.vertical_offset + last.vertical_scale, 1.0, epsilon = 1e-7);
    }

    #[rstest]
    #[case::smooth(0.0, 0, 0.0)]
    #[case::just_above_zero(0.1, 0, 0.5)]
    #[case::mid(0.5, 2, 0.5)]
    #[case::boundary(0.4, 2, 0.0)]
    #[case::rough(1.0, 4, 1.0)]
    #[case::over_range(3.0, 4, 1.0)]
    #[case::negative(-1.0, 0, 0.0)]
    fn selects_bands(#[case] roughness: f32, #[case] lower: usize, #[case] blend: f32) {
        let selection = RoughnessBands::default().select(roughness);
        assert_eq!(selection.lower, lower);
        assert_eq!(selection.upper, lower + 1);
        assert_abs_diff_eq!(selection.blend, blend, epsilon = 1e-5);
    }

    #[test]
    fn never_selects_past_terminal_band() {
        let bands = RoughnessBands::new(3);
        for step in 0..=100 {
            let selection = bands.select(step as f32 / 100.0);
            assert!(selection.upper <= 3);
        }
    }

    #[test]
    fn band_count_is_clamped() {
        assert_eq!(RoughnessBands::new(0).band_count(), 1);
        assert_eq!(RoughnessBands::new(99).band_count(), MAX_BAND_COUNT);
    }

    #[test]
    fn atlas_uv_stays_inside_rect() {
        let bands = RoughnessBands::default();
        let rect = bands.rect(2);
        let north = rect.atlas_uv(Vec2::new(1.0, 1.0), Vec2::ZERO);
        let south = rect.atlas_uv(Vec2::new(0.0, 0.0), Vec2::ZERO);
        assert_abs_diff_eq!(north.y, rect.vertical_offset, epsilon = 1e-7);
        assert_abs_diff_eq!(south.y, rect.vertical_offset + rect.vertical_scale, epsilon = 1e-7);
        assert_abs_diff_eq!(north.x, rect.horizontal_scale, epsilon = 1e-7);
    }

    #[test]
    fn atlas_uv_keeps_half_a_texel_from_band_edges() {
        let bands = RoughnessBands::default();
        let rect = bands.rect(1);
        let half = Vec2::new(0.5 / 32.0, 0.5 / 64.0);

        let north = rect.atlas_uv(Vec2::new(1.0, 1.0), half);
        assert_abs_diff_eq!(north.y, rect.vertical_offset + half.y, epsilon = 1e-7);
        assert_abs_diff_eq!(north.x, rect.horizontal_scale - half.x, epsilon = 1e-7);

        let south = rect.atlas_uv(Vec2::new(0.0, 0.0), half);
        assert_abs_diff_eq!(south.y, rect.vertical_offset + rect.vertical_scale - half.y, epsilon = 1e-7);
        assert_abs_diff_eq!(south.x, half.x, epsilon = 1e-7);
    }

    #[test]
    fn sub_texel_band_collapses_to_its_center() {
        let rect = RoughnessBands::new(MAX_BAND_COUNT).rect(MAX_BAND_COUNT as usize);
        let half = Vec2::splat(0.5 / 64.0);
        let uv = rect.atlas_uv(Vec2::new(0.9, 0.1), half);
        assert_abs_diff_eq!(uv.x, rect.horizontal_scale * 0.5, epsilon = 1e-7);
        assert_abs_diff_eq!(uv.y, rect.vertical_offset + rect.vertical_scale * 0.5, epsilon = 1e-7);
    }

    #[test]
    fn rough_specular_reads_terminal_band() {
        let bands = RoughnessBands::default();
        let terminal_top = bands.rect(5).vertical_offset;
        // White in the terminal band, black elsewhere.
        let atlas = move |uv: Vec2| {
            if uv.y >= terminal_top {
                Vec4::ONE
            } else {
                Vec4::new(0.0, 0.0, 0.0, 1.0)
            }
        };
        let radiance = specular_radiance(&atlas, &bands, Vec3::X, 1.0);
        assert_abs_diff_eq!(radiance.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn alpha_scales_diffuse_irradiance() {
        let map = |_: Vec2| Vec4::new(1.0, 1.0, 1.0, 0.5);
        let irradiance = diffuse_irradiance(&map, Vec3::Y);
        assert_abs_diff_eq!(irradiance.x, 0.5, epsilon = 1e-6);
    }
}
