//! WGSL modules the sphere program is assembled from.
//!
//! Each module mirrors a CPU reference in [`crate::shading`] and uses the same
//! constants, so the two can be checked against each other.

/// Scene uniform block and vertex stage. Object space is world space.
pub const SCENE_MODULE: &str = r#"
struct SceneUniforms {
    ws_to_cs: mat4x4<f32>,
    camera_position: vec4<f32>,
    light_position: vec4<f32>,
    light_color_intensity: vec4<f32>,
    albedo_metallic: vec4<f32>,
    material_params: vec4<f32>,
}

@group(0) @binding(0) var<uniform> scene: SceneUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) view_direction: vec3<f32>,
    @location(2) world_position: vec3<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = scene.ws_to_cs * vec4<f32>(in.position, 1.0);
    out.world_normal = in.normal;
    out.view_direction = scene.camera_position.xyz - in.position;
    out.world_position = in.position;
    return out;
}
"#;

/// sRGB transfer curve, alpha untouched.
pub const COLOR_MODULE: &str = r#"
fn srgb_to_linear(c: vec4<f32>) -> vec4<f32> {
    let low = c.rgb * 0.0773993808;
    let high = pow(c.rgb * 0.9478672986 + vec3<f32>(0.0521327014), vec3<f32>(2.4));
    return vec4<f32>(select(high, low, c.rgb <= vec3<f32>(0.04045)), c.a);
}

fn linear_to_srgb(c: vec4<f32>) -> vec4<f32> {
    let low = c.rgb * 12.92;
    let high = 1.055 * pow(max(c.rgb, vec3<f32>(0.0)), vec3<f32>(0.41666)) - vec3<f32>(0.055);
    return vec4<f32>(select(high, low, c.rgb <= vec3<f32>(0.0031308)), c.a);
}
"#;

/// Cook-Torrance terms.
pub const BRDF_MODULE: &str = r#"
const PI: f32 = 3.14159265358979;
const DIELECTRIC_F0: vec3<f32> = vec3<f32>(0.04, 0.04, 0.04);
const COSINE_EPSILON: f32 = 1e-5;
const NORMALIZE_EPSILON: f32 = 1e-10;
const MIN_POSITIVE: f32 = 1.17549435e-38;

fn safe_normalize(v: vec3<f32>, fallback: vec3<f32>) -> vec3<f32> {
    let length_squared = dot(v, v);
    if length_squared < NORMALIZE_EPSILON {
        return fallback;
    }
    return v * inverseSqrt(length_squared);
}

fn fresnel_schlick(f0: vec3<f32>, h: vec3<f32>, l: vec3<f32>) -> vec3<f32> {
    let falloff = pow(clamp(1.0 - dot(h, l), 0.0, 1.0), 5.0);
    return f0 + (vec3<f32>(1.0) - f0) * falloff;
}

fn distribution_ggx(n: vec3<f32>, h: vec3<f32>, roughness: f32) -> f32 {
    let a2 = roughness * roughness;
    let n_dot_h = max(dot(n, h), 0.0);
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    return a2 / max(PI * denom * denom, MIN_POSITIVE);
}

fn geometry_schlick_ggx(n_dot_x: f32, k: f32) -> f32 {
    return n_dot_x / (n_dot_x * (1.0 - k) + k);
}

fn geometry_smith(n: vec3<f32>, v: vec3<f32>, l: vec3<f32>, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = r * r / 8.0;
    return geometry_schlick_ggx(max(dot(n, v), 0.0), k) * geometry_schlick_ggx(max(dot(n, l), 0.0), k);
}
"#;

/// Latitude/longitude mapping, seam on -X.
pub const EQUIRECT_MODULE: &str = r#"
fn direction_to_uv(d: vec3<f32>) -> vec2<f32> {
    return vec2<f32>(
        atan2(d.z, d.x) / (2.0 * PI) + 0.5,
        asin(clamp(d.y, -1.0, 1.0)) / PI + 0.5,
    );
}

fn texel_uv(uv: vec2<f32>) -> vec2<f32> {
    return vec2<f32>(uv.x, 1.0 - uv.y);
}

fn decode_texel(texel: vec4<f32>) -> vec3<f32> {
    let decoded = srgb_to_linear(texel);
    return decoded.rgb * decoded.a;
}
"#;

/// Diffuse lookup when the irradiance map is bound.
pub const DIFFUSE_IBL_MODULE: &str = r#"
@group(1) @binding(0) var diffuse_sampler: sampler;
@group(1) @binding(1) var diffuse_map: texture_2d<f32>;

fn diffuse_irradiance(n: vec3<f32>) -> vec3<f32> {
    let uv = texel_uv(direction_to_uv(n));
    return decode_texel(textureSampleLevel(diffuse_map, diffuse_sampler, uv, 0.0));
}
"#;

pub const DIFFUSE_IBL_STUB: &str = r#"
fn diffuse_irradiance(n: vec3<f32>) -> vec3<f32> {
    return vec3<f32>(0.0);
}
"#;

/// Band-blended lookup into the specular atlas. Needs `BAND_COUNT` and
/// `BAND_RECTS` from the generated band table.
pub const SPECULAR_IBL_MODULE: &str = r#"
@group(1) @binding(2) var specular_sampler: sampler;
@group(1) @binding(3) var specular_map: texture_2d<f32>;

fn inset(value: f32, start: f32, extent: f32, margin: f32) -> f32 {
    if extent <= 2.0 * margin {
        return start + 0.5 * extent;
    }
    return clamp(value, start + margin, start + extent - margin);
}

fn band_uv(band: u32, uv: vec2<f32>) -> vec2<f32> {
    let rect = BAND_RECTS[band];
    let texel = texel_uv(uv);
    let half_texel = vec2<f32>(0.5) / vec2<f32>(textureDimensions(specular_map));
    return vec2<f32>(
        inset(texel.x * rect.y, 0.0, rect.y, half_texel.x),
        inset(rect.x + texel.y * rect.z, rect.x, rect.z, half_texel.y),
    );
}

fn specular_radiance(r: vec3<f32>, roughness: f32) -> vec3<f32> {
    let uv = direction_to_uv(r);
    let scaled = clamp(roughness, 0.0, 1.0) * f32(BAND_COUNT);
    let lower = min(u32(floor(scaled)), BAND_COUNT - 1u);
    let blend = clamp(scaled - f32(lower), 0.0, 1.0);
    let a = decode_texel(textureSampleLevel(specular_map, specular_sampler, band_uv(lower, uv), 0.0));
    let b = decode_texel(textureSampleLevel(specular_map, specular_sampler, band_uv(lower + 1u, uv), 0.0));
    return mix(a, b, blend);
}
"#;

pub const SPECULAR_IBL_STUB: &str = r#"
fn specular_radiance(r: vec3<f32>, roughness: f32) -> vec3<f32> {
    return vec3<f32>(0.0);
}
"#;

/// Fragment stage: direct + diffuse indirect + specular indirect, encoded to sRGB.
pub const FRAGMENT_MODULE: &str = r#"
fn shade(in: VertexOutput) -> vec3<f32> {
    let n = safe_normalize(in.world_normal, vec3<f32>(0.0, 0.0, 1.0));
    let v = safe_normalize(in.view_direction, n);
    let l = safe_normalize(scene.light_position.xyz - in.world_position, n);
    let h = safe_normalize(l + v, n);

    let albedo = srgb_to_linear(vec4<f32>(scene.albedo_metallic.rgb, 1.0)).rgb;
    let metallic = scene.albedo_metallic.w;
    let roughness = scene.material_params.x;
    let intensity = scene.light_color_intensity.w;

    let k_s = fresnel_schlick(DIELECTRIC_F0, h, l);
    let k_d = (vec3<f32>(1.0) - k_s) * (1.0 - metallic);
    let n_dot_l = dot(n, l);
    let n_dot_v = dot(n, v);

    let d = distribution_ggx(n, h, roughness);
    let g = geometry_smith(n, v, l, roughness);
    let specular = k_s * g * d / (4.0 * max(n_dot_v, COSINE_EPSILON) * max(n_dot_l, COSINE_EPSILON));
    let diffuse = k_d * albedo / PI;
    let direct = (diffuse + specular) * intensity * max(n_dot_l, 0.0);

    let diffuse_indirect = k_d * albedo * diffuse_irradiance(n);
    let specular_indirect = k_s * specular_radiance(reflect(-v, n), roughness);
    return direct + diffuse_indirect + specular_indirect;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return linear_to_srgb(vec4<f32>(shade(in), 1.0));
}
"#;
