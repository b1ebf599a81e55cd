//! Equirectangular (latitude/longitude) mapping of unit directions.

use glam::{Vec2, Vec3};
use std::f32::consts::PI;

/// Map a unit direction to `(u, v)` in `[0, 1]^2`.
///
/// `u` follows the azimuth around +Y with the seam on the -X axis; `v` is the
/// elevation, 0 at the south pole and 1 at the north pole.
pub fn direction_to_uv(direction: Vec3) -> Vec2 {
    Vec2::new(
        direction.z.atan2(direction.x) / (2.0 * PI) + 0.5,
        direction.y.clamp(-1.0, 1.0).asin() / PI + 0.5,
    )
}

/// Image-space coordinate of `uv`: rows grow downward, so the north pole is row 0.
pub fn texel_uv(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x, 1.0 - uv.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    #[case::plus_x(Vec3::X, Vec2::new(0.5, 0.5))]
    #[case::plus_z(Vec3::Z, Vec2::new(0.75, 0.5))]
    #[case::minus_z(-Vec3::Z, Vec2::new(0.25, 0.5))]
    fn maps_axes(#[case] direction: Vec3, #[case] expected: Vec2) {
        let uv = direction_to_uv(direction);
        assert_abs_diff_eq!(uv.x, expected.x, epsilon = 1e-6);
        assert_abs_diff_eq!(uv.y, expected.y, epsilon = 1e-6);
    }

    // Longitude is undefined at the poles; `-Vec3::Y` carries signed zeros
    // that push `atan2` to -PI, so only `v` is pinned.
    #[rstest]
    #[case::north(Vec3::Y, 1.0)]
    #[case::south(-Vec3::Y, 0.0)]
    #[case::south_positive_zero(Vec3::new(0.0, -1.0, 0.0), 0.0)]
    fn poles_map_to_v_extremes(#[case] direction: Vec3, #[case] expected_v: f32) {
        let uv = direction_to_uv(direction);
        assert!((0.0..=1.0).contains(&uv.x), "{}", uv.x);
        assert_abs_diff_eq!(uv.y, expected_v, epsilon = 1e-6);
    }

    #[test]
    fn seam_splits_opposite_sides() {
        let eps = 1e-3_f32;
        let y = 0.2_f32;
        let r = (1.0 - y * y).sqrt();
        let above = direction_to_uv(Vec3::new(-r * eps.cos(), y, r * eps.sin()));
        let below = direction_to_uv(Vec3::new(-r * eps.cos(), y, -r * eps.sin()));
        assert!(above.x > 0.99, "{}", above.x);
        assert!(below.x < 0.01, "{}", below.x);
        assert_abs_diff_eq!(above.y, below.y, epsilon = 1e-6);
    }

    #[test]
    fn plus_x_neighbors_straddle_the_center() {
        let eps = 1e-3_f32;
        let left = direction_to_uv(Vec3::new(eps.cos(), 0.0, -eps.sin()));
        let right = direction_to_uv(Vec3::new(eps.cos(), 0.0, eps.sin()));
        assert!(left.x < 0.5 && right.x > 0.5);
    }

    #[test]
    fn out_of_range_elevation_is_clamped() {
        let uv = direction_to_uv(Vec3::new(0.0, 1.0 + 1e-6, 0.0));
        assert!(uv.y.is_finite());
        assert_abs_diff_eq!(uv.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn texel_rows_are_flipped() {
        assert_eq!(texel_uv(Vec2::new(0.25, 1.0)), Vec2::new(0.25, 0.0));
    }
}
