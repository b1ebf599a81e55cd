//! End-to-end frame tests against the recording backend.

use approx::assert_abs_diff_eq;
use glam::{Vec3, Vec4};
use rstest::rstest;
use std::f32::consts::FRAC_1_PI;

use pbr_viewer::backend::dummy::{DummyBackend, RecordedCommand};
use pbr_viewer::backend::GraphicsBackend;
use pbr_viewer::resources::{EnvironmentImage, EnvironmentSlot, EnvironmentSources, Mesh, TextureData};
use pbr_viewer::scene::{ControlState, Scene};
use pbr_viewer::shader::ShadingCapabilities;
use pbr_viewer::shading::ibl::{decode_texel, specular_radiance, EnvironmentSampler, RoughnessBands};
use pbr_viewer::shading::{shade_fragment, shade_pixel, Fragment, ShadingEnvironment};
use pbr_viewer::{FrameRenderer, RenderError, RendererConfig, RendererState};

fn renderer_with(backend: &mut DummyBackend, environment: &EnvironmentSources) -> FrameRenderer {
    let config = RendererConfig::default();
    let mut renderer = FrameRenderer::new(&config);
    renderer
        .initialize(backend, &Mesh::sphere(16, 8), environment)
        .expect("initialize");
    renderer
}

fn reference_scene() -> Scene {
    let mut scene = Scene::default();
    scene.light.position = Vec3::new(0.0, 0.0, 2.0);
    scene.light.intensity = 1.0;
    scene
}

/// Atlas filled with a grey level per band (band `k` is `40 * k`); texels to
/// the right of a band's width are white.
fn banded_atlas(bands: &RoughnessBands) -> TextureData {
    let (width, height) = (32u32, 64u32);
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for row in 0..height {
        let y = (row as f32 + 0.5) / height as f32;
        let band = bands
            .rects()
            .iter()
            .rposition(|rect| y >= rect.vertical_offset)
            .unwrap_or(0);
        let band_width = bands.rect(band).horizontal_scale;
        for column in 0..width {
            let x = (column as f32 + 0.5) / width as f32;
            let level = if x < band_width { (40 * band) as u8 } else { 255 };
            data.extend_from_slice(&[level, level, level, 255]);
        }
    }
    TextureData::from_rgba8(width, height, data, "atlas").unwrap()
}

fn grey(level: u8) -> Vec3 {
    let v = level as f32 / 255.0;
    decode_texel(Vec4::new(v, v, v, 1.0))
}

#[test]
fn analytic_frame_matches_reference_irradiance() {
    let mut backend = DummyBackend::new(640, 480);
    let mut renderer = renderer_with(&mut backend, &EnvironmentSources::default());
    let frame = backend.begin_frame().unwrap();
    let uniforms = renderer
        .render_frame(&mut backend, &frame, &reference_scene())
        .unwrap();
    backend.end_frame().unwrap();

    let bands = RoughnessBands::default();
    let fragment = Fragment::from_vertex(Vec3::Z, Vec3::Z, uniforms.camera_position);
    let total = shade_fragment(&fragment, &uniforms, &ShadingEnvironment::analytic(&bands)).total();
    assert_abs_diff_eq!(total.x, FRAC_1_PI, epsilon = 1e-5);
    assert_abs_diff_eq!(total.y, FRAC_1_PI, epsilon = 1e-5);
    assert_abs_diff_eq!(total.z, FRAC_1_PI, epsilon = 1e-5);

    let pixel = shade_pixel(&fragment, &uniforms, &ShadingEnvironment::analytic(&bands));
    assert_abs_diff_eq!(pixel.x, 0.5998, epsilon = 1e-3);
    assert_eq!(backend.frames_presented(), 1);
}

#[test]
fn frame_uploads_uniforms_and_draws_whole_mesh() {
    let mut backend = DummyBackend::new(320, 240);
    let mut renderer = renderer_with(&mut backend, &EnvironmentSources::default());
    let frame = backend.begin_frame().unwrap();
    let uniforms = renderer
        .render_frame(&mut backend, &frame, &reference_scene())
        .unwrap();

    let mesh = Mesh::sphere(16, 8);
    let draws: Vec<_> = backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            RecordedCommand::DrawIndexed { indices, instances } => Some((indices.clone(), instances.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(draws, vec![(0..mesh.index_count() as u32, 0..1)]);

    let program = renderer.program().unwrap();
    assert_eq!(program.capabilities(), ShadingCapabilities::ANALYTIC);
    assert!(!program.source().contains("@group(1)"));
    assert_eq!(uniforms.gpu_data().light_position.truncate(), Vec3::new(0.0, 0.0, 2.0));
}

#[test]
fn resize_changes_only_the_projection() {
    let mut backend = DummyBackend::new(400, 400);
    let mut renderer = renderer_with(&mut backend, &EnvironmentSources::default());
    let scene = reference_scene();

    let frame = backend.begin_frame().unwrap();
    let square = renderer.render_frame(&mut backend, &frame, &scene).unwrap();
    backend.end_frame().unwrap();

    backend.resize(800, 400);
    let frame = backend.begin_frame().unwrap();
    let wide = renderer.render_frame(&mut backend, &frame, &scene).unwrap();

    assert_ne!(square.camera_ws_to_cs, wide.camera_ws_to_cs);
    let mut expected = square.clone();
    expected.camera_ws_to_cs = wide.camera_ws_to_cs;
    assert_eq!(expected, wide);
}

#[test]
fn controls_flow_into_the_frame() {
    let mut backend = DummyBackend::new(64, 64);
    let mut renderer = renderer_with(&mut backend, &EnvironmentSources::default());
    let mut scene = Scene::default();
    let controls = ControlState {
        albedo: [255, 0, 0],
        light_coordinate: [255, 0],
        metallic: 1.0,
        roughness: 0.25,
        light_strength: 4.0,
    };
    scene.apply_controls(&controls);

    let frame = backend.begin_frame().unwrap();
    let uniforms = renderer.render_frame(&mut backend, &frame, &scene).unwrap();
    assert_eq!(uniforms.light_position, Vec3::new(1.0, -1.0, 2.0));
    assert_eq!(uniforms.light_intensity, 4.0);
    assert_eq!(uniforms.material_albedo, Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(uniforms.material_metallic, 1.0);
    assert_eq!(uniforms.material_roughness, 0.25);
}

#[test]
fn late_environment_rebuilds_the_program() {
    let mut backend = DummyBackend::new(64, 64);
    let mut renderer = renderer_with(&mut backend, &EnvironmentSources::default());
    assert_eq!(renderer.capabilities(), ShadingCapabilities::ANALYTIC);

    let atlas = banded_atlas(renderer.bands());
    renderer
        .attach_environment(&mut backend, EnvironmentSlot::Specular, &atlas)
        .unwrap();
    assert!(renderer.capabilities().specular_ibl);
    assert_eq!(backend.live_pipelines(), 1);

    let frame = backend.begin_frame().unwrap();
    let uniforms = renderer
        .render_frame(&mut backend, &frame, &reference_scene())
        .unwrap();
    assert!(uniforms.environment.specular.is_some());
    assert!(backend
        .commands()
        .iter()
        .any(|c| matches!(c, RecordedCommand::SetBindGroup { index: 1, .. })));

    let view = uniforms.environment.specular.unwrap();
    let uploaded = backend.view_texture(view).unwrap();
    assert_eq!(uploaded.data.as_deref(), Some(atlas.data.as_slice()));
}

#[test]
fn failed_rebuild_keeps_previous_program() {
    let mut backend = DummyBackend::new(64, 64);
    let mut renderer = renderer_with(&mut backend, &EnvironmentSources::default());
    let textures_before = backend.live_textures();

    backend.failures.create_pipeline = true;
    let err = renderer
        .attach_environment(
            &mut backend,
            EnvironmentSlot::Diffuse,
            &TextureData::solid_color([200, 200, 200, 255], "diffuse"),
        )
        .unwrap_err();
    assert!(matches!(err, RenderError::Backend(_)));
    assert_eq!(renderer.capabilities(), ShadingCapabilities::ANALYTIC);
    assert_eq!(backend.live_textures(), textures_before);
    assert_eq!(renderer.state(), RendererState::Ready);

    backend.failures.create_pipeline = false;
    let frame = backend.begin_frame().unwrap();
    assert!(renderer
        .render_frame(&mut backend, &frame, &reference_scene())
        .is_ok());
}

#[test]
fn attaching_before_initialize_is_rejected() {
    let mut backend = DummyBackend::new(64, 64);
    let mut renderer = FrameRenderer::new(&RendererConfig::default());
    let err = renderer
        .attach_environment(
            &mut backend,
            EnvironmentSlot::Specular,
            &TextureData::solid_color([0, 0, 0, 255], "atlas"),
        )
        .unwrap_err();
    assert!(matches!(err, RenderError::InvalidState { .. }));
    assert_eq!(backend.live_textures(), 0);
}

#[rstest]
#[case::mirror(0.0, grey(0))]
#[case::between_first_bands(0.3, grey(40).lerp(grey(80), 0.5))]
#[case::rough_reaches_terminal(1.0, grey(200))]
fn atlas_bands_blend_by_roughness(#[case] roughness: f32, #[case] expected: Vec3) {
    let bands = RoughnessBands::default();
    let atlas = EnvironmentImage::new(banded_atlas(&bands), EnvironmentSlot::Specular);
    let radiance = specular_radiance(&atlas, &bands, Vec3::Z, roughness);
    assert_abs_diff_eq!(radiance.x, expected.x, epsilon = 1e-4);
}

#[rstest]
#[case::north_pole(Vec3::Y)]
#[case::south_pole(Vec3::new(0.0, -1.0, 0.0))]
#[case::seam(Vec3::new(-1.0, 0.0, 1e-4))]
fn atlas_band_edges_stay_inside_their_band(#[case] direction: Vec3) {
    let bands = RoughnessBands::default();
    let atlas = EnvironmentImage::new(banded_atlas(&bands), EnvironmentSlot::Specular);
    let radiance = specular_radiance(&atlas, &bands, direction, 0.2);
    assert_abs_diff_eq!(radiance.x, grey(40).x, epsilon = 1e-5);
}

#[test]
fn diffuse_environment_scales_with_albedo() {
    let bands = RoughnessBands::default();
    let diffuse = EnvironmentImage::new(
        TextureData::solid_color([128, 128, 128, 255], "diffuse"),
        EnvironmentSlot::Diffuse,
    );
    let mut backend = DummyBackend::new(64, 64);
    let mut renderer = renderer_with(&mut backend, &EnvironmentSources::default());
    let mut scene = reference_scene();
    scene.material.albedo = Vec3::new(1.0, 0.0, 0.0);

    let frame = backend.begin_frame().unwrap();
    let uniforms = renderer.render_frame(&mut backend, &frame, &scene).unwrap();
    let fragment = Fragment::from_vertex(Vec3::Z, Vec3::Z, uniforms.camera_position);
    let environment = ShadingEnvironment {
        diffuse: Some(&diffuse as &dyn EnvironmentSampler),
        specular: None,
        bands: &bands,
    };
    let shaded = shade_fragment(&fragment, &uniforms, &environment);
    assert_abs_diff_eq!(shaded.diffuse_indirect.x, 0.96 * grey(128).x, epsilon = 1e-5);
    assert_eq!(shaded.diffuse_indirect.y, 0.0);
    assert_eq!(shaded.specular_indirect, Vec3::ZERO);
}
