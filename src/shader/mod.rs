//! Sphere program generation.
//!
//! One shading function, specialized at build time by [`ShadingCapabilities`].
//! Environment lookups that are not available compile to stubs returning zero,
//! and their bindings are left out of the program entirely.
//!
//! The generated WGSL is parsed and validated with naga before it is handed to
//! a backend, so a broken program surfaces as [`RenderError::ShaderCompilation`]
//! instead of a device error later on.

pub mod library;

use crate::error::{RenderError, RenderResult};
use crate::shading::ibl::RoughnessBands;
use crate::uniforms::{self, EnvironmentBindings, FrameUniforms, UniformKind};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Environment lookups compiled into a program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ShadingCapabilities {
    pub diffuse_ibl: bool,
    pub specular_ibl: bool,
}

impl ShadingCapabilities {
    /// Point light only.
    pub const ANALYTIC: Self = Self {
        diffuse_ibl: false,
        specular_ibl: false,
    };

    pub const FULL: Self = Self {
        diffuse_ibl: true,
        specular_ibl: true,
    };

    /// Capabilities for whatever environment textures are currently uploaded.
    pub fn from_bindings(bindings: &EnvironmentBindings) -> Self {
        Self {
            diffuse_ibl: bindings.diffuse.is_some(),
            specular_ibl: bindings.specular.is_some(),
        }
    }

    /// Whether the program reads bind group 1.
    pub fn uses_environment(&self) -> bool {
        self.diffuse_ibl || self.specular_ibl
    }

    pub fn label(&self) -> &'static str {
        match (self.diffuse_ibl, self.specular_ibl) {
            (false, false) => "sphere (analytic)",
            (true, false) => "sphere (diffuse ibl)",
            (false, true) => "sphere (specular ibl)",
            (true, true) => "sphere (full ibl)",
        }
    }
}

/// A uniform the program reads, by name and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformDeclaration {
    pub name: &'static str,
    pub kind: UniformKind,
}

/// The set of uniforms a program expects to find before every draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramInterface {
    uniforms: Vec<UniformDeclaration>,
}

impl ProgramInterface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sphere program's inputs for the given capabilities.
    pub fn for_capabilities(capabilities: ShadingCapabilities) -> Self {
        let mut interface = Self::new()
            .declare(uniforms::MATERIAL_ALBEDO, UniformKind::Vec3)
            .declare(uniforms::MATERIAL_METALLIC, UniformKind::Scalar)
            .declare(uniforms::MATERIAL_ROUGHNESS, UniformKind::Scalar)
            .declare(uniforms::LIGHT_POSITION, UniformKind::Vec3)
            .declare(uniforms::LIGHT_COLOR, UniformKind::Vec3)
            .declare(uniforms::LIGHT_INTENSITY, UniformKind::Scalar)
            .declare(uniforms::CAMERA_WS_TO_CS, UniformKind::Mat4)
            .declare(uniforms::CAMERA_POSITION, UniformKind::Vec3);
        if capabilities.diffuse_ibl {
            interface = interface.declare(uniforms::ENVIRONMENT_DIFFUSE, UniformKind::Texture);
        }
        if capabilities.specular_ibl {
            interface = interface.declare(uniforms::ENVIRONMENT_SPECULAR, UniformKind::Texture);
        }
        interface
    }

    pub fn declare(mut self, name: &'static str, kind: UniformKind) -> Self {
        self.uniforms.push(UniformDeclaration { name, kind });
        self
    }

    pub fn uniforms(&self) -> &[UniformDeclaration] {
        &self.uniforms
    }

    pub fn declares(&self, name: &str) -> bool {
        self.uniforms.iter().any(|u| u.name == name)
    }

    /// Check that every declared uniform is present with the declared type.
    pub fn validate(&self, uniforms: &FrameUniforms) -> RenderResult<()> {
        for declaration in &self.uniforms {
            let value = uniforms
                .get(declaration.name)
                .ok_or_else(|| RenderError::MissingUniform {
                    name: declaration.name.to_string(),
                })?;
            if value.kind() != declaration.kind {
                return Err(RenderError::UniformTypeMismatch {
                    name: declaration.name.to_string(),
                    expected: declaration.kind,
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }
}

/// Validated WGSL for one capability set
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    capabilities: ShadingCapabilities,
    interface: ProgramInterface,
    source: String,
}

impl ShaderProgram {
    pub fn build(capabilities: ShadingCapabilities, bands: &RoughnessBands) -> RenderResult<Self> {
        let source = compose(capabilities, bands);
        validate_wgsl(&source)?;
        log::debug!(
            "Built program '{}' with {} roughness bands",
            capabilities.label(),
            bands.band_count()
        );
        Ok(Self {
            capabilities,
            interface: ProgramInterface::for_capabilities(capabilities),
            source,
        })
    }

    pub fn capabilities(&self) -> ShadingCapabilities {
        self.capabilities
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// WGSL declarations of the roughness band table.
pub fn band_table_source(bands: &RoughnessBands) -> String {
    let rects = bands.rects();
    let entries: String = rects
        .iter()
        .map(|rect| {
            format!(
                "    vec3<f32>({:.10}, {:.10}, {:.10}),\n",
                rect.vertical_offset, rect.horizontal_scale, rect.vertical_scale
            )
        })
        .collect();
    format!(
        "const BAND_COUNT: u32 = {count}u;\n\
         var<private> BAND_RECTS: array<vec3<f32>, {len}> = array<vec3<f32>, {len}>(\n\
         {entries});\n",
        count = bands.band_count(),
        len = rects.len(),
    )
}

/// Assemble the program source for a capability set.
pub fn compose(capabilities: ShadingCapabilities, bands: &RoughnessBands) -> String {
    let mut source = String::new();
    source.push_str(library::SCENE_MODULE);
    source.push_str(library::COLOR_MODULE);
    source.push_str(library::BRDF_MODULE);
    source.push_str(library::EQUIRECT_MODULE);

    if capabilities.diffuse_ibl {
        source.push_str(library::DIFFUSE_IBL_MODULE);
    } else {
        source.push_str(library::DIFFUSE_IBL_STUB);
    }

    if capabilities.specular_ibl {
        source.push('\n');
        source.push_str(&band_table_source(bands));
        source.push_str(library::SPECULAR_IBL_MODULE);
    } else {
        source.push_str(library::SPECULAR_IBL_STUB);
    }

    source.push_str(library::FRAGMENT_MODULE);
    source
}

/// Parse and validate WGSL, and check both entry points are present.
pub fn validate_wgsl(source: &str) -> RenderResult<()> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| {
        RenderError::ShaderCompilation(format!("WGSL parse error: {}", e.emit_to_string(source)))
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| RenderError::ShaderCompilation(format!("Validation error: {e}")))?;

    for (entry, stage) in [
        (VERTEX_ENTRY, naga::ShaderStage::Vertex),
        (FRAGMENT_ENTRY, naga::ShaderStage::Fragment),
    ] {
        if !module
            .entry_points
            .iter()
            .any(|ep| ep.name == entry && ep.stage == stage)
        {
            return Err(RenderError::ShaderCompilation(format!(
                "Entry point '{}' not found for stage {:?}",
                entry, stage
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TextureViewHandle;
    use crate::resources::Material;
    use crate::scene::{Camera, PointLight};
    use rstest::rstest;

    fn frame_uniforms(environment: EnvironmentBindings) -> FrameUniforms {
        FrameUniforms::build(
            &Camera::default(),
            &PointLight::default(),
            &Material::default(),
            1.0,
            environment,
        )
    }

    #[rstest]
    #[case::analytic(ShadingCapabilities::ANALYTIC)]
    #[case::diffuse(ShadingCapabilities { diffuse_ibl: true, specular_ibl: false })]
    #[case::specular(ShadingCapabilities { diffuse_ibl: false, specular_ibl: true })]
    #[case::full(ShadingCapabilities::FULL)]
    fn every_capability_combination_validates(#[case] capabilities: ShadingCapabilities) {
        let program = ShaderProgram::build(capabilities, &RoughnessBands::default()).unwrap();
        let source = program.source();
        assert_eq!(source.contains("@group(1) @binding(1)"), capabilities.diffuse_ibl);
        assert_eq!(source.contains("@group(1) @binding(3)"), capabilities.specular_ibl);
        assert_eq!(source.contains("BAND_RECTS"), capabilities.specular_ibl);
    }

    #[rstest]
    #[case::single(1)]
    #[case::deepest(12)]
    fn band_table_size_follows_configuration(#[case] count: u32) {
        let bands = RoughnessBands::new(count);
        let program = ShaderProgram::build(ShadingCapabilities::FULL, &bands).unwrap();
        assert!(program
            .source()
            .contains(&format!("array<vec3<f32>, {}>", count + 1)));
        assert!(program.source().contains(&format!("BAND_COUNT: u32 = {}u", count)));
    }

    #[test]
    fn band_table_lists_terminal_rect_last() {
        let table = band_table_source(&RoughnessBands::default());
        let rows: Vec<&str> = table.lines().filter(|l| l.trim_start().starts_with("vec3")).collect();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].trim(), "vec3<f32>(0.0000000000, 1.0000000000, 0.5000000000),");
        assert_eq!(rows[5].trim(), "vec3<f32>(0.9687500000, 0.0625000000, 0.0312500000),");
        assert!(table.starts_with("const BAND_COUNT: u32 = 5u;\nvar<private> BAND_RECTS"));
        assert!(table.ends_with("0.0312500000),\n);\n"));
    }

    #[test]
    fn broken_source_reports_compilation_error() {
        let err = validate_wgsl("fn fs_main( {").unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompilation(_)));
    }

    #[test]
    fn missing_entry_point_is_rejected() {
        let err = validate_wgsl("@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }")
            .unwrap_err();
        assert!(err.to_string().contains("fs_main"));
    }

    #[test]
    fn interface_tracks_capabilities() {
        let analytic = ProgramInterface::for_capabilities(ShadingCapabilities::ANALYTIC);
        assert_eq!(analytic.uniforms().len(), 8);
        assert!(!analytic.declares(uniforms::ENVIRONMENT_DIFFUSE));

        let full = ProgramInterface::for_capabilities(ShadingCapabilities::FULL);
        assert!(full.declares(uniforms::ENVIRONMENT_DIFFUSE));
        assert!(full.declares(uniforms::ENVIRONMENT_SPECULAR));
    }

    #[test]
    fn unbound_texture_is_a_missing_uniform() {
        let interface = ProgramInterface::for_capabilities(ShadingCapabilities::FULL);
        let environment = EnvironmentBindings {
            diffuse: Some(TextureViewHandle(1)),
            specular: None,
        };
        match interface.validate(&frame_uniforms(environment)) {
            Err(RenderError::MissingUniform { name }) => assert_eq!(name, "environment.specular"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn wrongly_typed_uniform_is_rejected() {
        let interface = ProgramInterface::new().declare(uniforms::LIGHT_INTENSITY, UniformKind::Vec3);
        match interface.validate(&frame_uniforms(EnvironmentBindings::default())) {
            Err(RenderError::UniformTypeMismatch { name, expected, found }) => {
                assert_eq!(name, "light.intensity");
                assert_eq!(expected, UniformKind::Vec3);
                assert_eq!(found, UniformKind::Scalar);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn complete_uniforms_pass() {
        let interface = ProgramInterface::for_capabilities(ShadingCapabilities::ANALYTIC);
        assert!(interface.validate(&frame_uniforms(EnvironmentBindings::default())).is_ok());
    }

    #[test]
    fn capabilities_follow_bindings() {
        let bindings = EnvironmentBindings {
            diffuse: None,
            specular: Some(TextureViewHandle(3)),
        };
        let capabilities = ShadingCapabilities::from_bindings(&bindings);
        assert!(!capabilities.diffuse_ibl);
        assert!(capabilities.specular_ibl);
        assert!(capabilities.uses_environment());
    }
}
