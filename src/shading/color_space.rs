//! sRGB <-> linear conversion.
//!
//! Texture samples are decoded right after sampling and the final pixel is
//! encoded right before it is written; everything in between stays linear.

use glam::{Vec3, Vec4};

/// Largest encoded value on the linear segment of the sRGB curve.
pub const SRGB_LINEAR_THRESHOLD: f32 = 0.04045;
/// Largest linear value on the linear segment of the sRGB curve.
pub const LINEAR_SRGB_THRESHOLD: f32 = 0.0031308;

/// Decode one sRGB-encoded channel.
pub fn srgb_channel_to_linear(value: f32) -> f32 {
    if value <= SRGB_LINEAR_THRESHOLD {
        value * 0.077_399_38
    } else {
        (value * 0.947_867_3 + 0.052_132_7).powf(2.4)
    }
}

/// Encode one linear channel.
pub fn linear_channel_to_srgb(value: f32) -> f32 {
    if value <= LINEAR_SRGB_THRESHOLD {
        value * 12.92
    } else {
        1.055 * value.powf(0.41666) - 0.055
    }
}

pub fn srgb_to_linear_rgb(color: Vec3) -> Vec3 {
    Vec3::new(
        srgb_channel_to_linear(color.x),
        srgb_channel_to_linear(color.y),
        srgb_channel_to_linear(color.z),
    )
}

pub fn linear_to_srgb_rgb(color: Vec3) -> Vec3 {
    Vec3::new(
        linear_channel_to_srgb(color.x),
        linear_channel_to_srgb(color.y),
        linear_channel_to_srgb(color.z),
    )
}

/// Decode an sRGB color; alpha passes through.
pub fn srgb_to_linear(color: Vec4) -> Vec4 {
    srgb_to_linear_rgb(color.truncate()).extend(color.w)
}

/// Encode a linear color; alpha passes through.
pub fn linear_to_srgb(color: Vec4) -> Vec4 {
    linear_to_srgb_rgb(color.truncate()).extend(color.w)
}
