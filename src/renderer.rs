//! Frame renderer
//!
//! Owns every GPU resource of the sphere pass and walks the
//! `Uninitialized -> Ready <-> Rendering` lifecycle. Frame begin/end stays with
//! the caller so other passes (the parameter panel) can share the frame.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::error::{RenderError, RenderResult};
use crate::resources::{EnvironmentSlot, EnvironmentSources, GpuMesh, GpuTexture, Mesh, TextureData};
use crate::scene::Scene;
use crate::shader::{ShaderProgram, ShadingCapabilities};
use crate::shading::ibl::RoughnessBands;
use crate::uniforms::{EnvironmentBindings, FrameUniforms, SceneUniformData};
use crate::RendererConfig;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Lifecycle of a [`FrameRenderer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    Ready,
    Rendering,
}

impl RendererState {
    pub fn name(&self) -> &'static str {
        match self {
            RendererState::Uninitialized => "uninitialized",
            RendererState::Ready => "ready",
            RendererState::Rendering => "rendering",
        }
    }
}

/// An uploaded environment map and the sampler it is read with
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentTexture {
    pub texture: GpuTexture,
    pub sampler: SamplerHandle,
}

impl EnvironmentTexture {
    fn upload<B: GraphicsBackend + ?Sized>(
        backend: &mut B,
        slot: EnvironmentSlot,
        data: &TextureData,
    ) -> BackendResult<Self> {
        let texture = GpuTexture::create(backend, data)?;
        match backend.create_sampler(&slot.sampler_descriptor()) {
            Ok(sampler) => Ok(Self { texture, sampler }),
            Err(e) => {
                texture.destroy(backend);
                Err(e)
            }
        }
    }

    fn destroy<B: GraphicsBackend + ?Sized>(self, backend: &mut B) {
        self.texture.destroy(backend);
        backend.destroy_sampler(self.sampler);
    }
}

struct ProgramResources {
    program: ShaderProgram,
    pipeline: RenderPipelineHandle,
    environment_layout: Option<BindGroupLayoutHandle>,
    environment_group: Option<BindGroupHandle>,
}

struct SceneBinding {
    buffer: BufferHandle,
    layout: BindGroupLayoutHandle,
    group: BindGroupHandle,
}

struct DepthTarget {
    texture: TextureHandle,
    view: TextureViewHandle,
    width: u32,
    height: u32,
}

/// Draws the shaded sphere, one draw call per frame.
pub struct FrameRenderer {
    state: RendererState,
    bands: RoughnessBands,
    clear_color: [f32; 4],
    mesh: Option<GpuMesh>,
    scene: Option<SceneBinding>,
    diffuse: Option<EnvironmentTexture>,
    specular: Option<EnvironmentTexture>,
    program: Option<ProgramResources>,
    depth: Option<DepthTarget>,
}

impl FrameRenderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            state: RendererState::Uninitialized,
            bands: RoughnessBands::new(config.band_count),
            clear_color: config.clear_color,
            mesh: None,
            scene: None,
            diffuse: None,
            specular: None,
            program: None,
            depth: None,
        }
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn bands(&self) -> &RoughnessBands {
        &self.bands
    }

    /// The active program, once initialized.
    pub fn program(&self) -> Option<&ShaderProgram> {
        self.program.as_ref().map(|p| &p.program)
    }

    pub fn capabilities(&self) -> ShadingCapabilities {
        ShadingCapabilities::from_bindings(&self.environment_bindings())
    }

    pub fn mesh(&self) -> Option<&GpuMesh> {
        self.mesh.as_ref()
    }

    pub fn environment(&self, slot: EnvironmentSlot) -> Option<&EnvironmentTexture> {
        match slot {
            EnvironmentSlot::Diffuse => self.diffuse.as_ref(),
            EnvironmentSlot::Specular => self.specular.as_ref(),
        }
    }

    /// Views of the environment textures that are fully uploaded.
    pub fn environment_bindings(&self) -> EnvironmentBindings {
        EnvironmentBindings {
            diffuse: self.diffuse.as_ref().map(|e| e.texture.view),
            specular: self.specular.as_ref().map(|e| e.texture.view),
        }
    }

    fn expect_state(&self, expected: RendererState, operation: &'static str) -> RenderResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RenderError::InvalidState {
                operation,
                state: self.state.name(),
            })
        }
    }

    fn slot_mut(&mut self, slot: EnvironmentSlot) -> &mut Option<EnvironmentTexture> {
        match slot {
            EnvironmentSlot::Diffuse => &mut self.diffuse,
            EnvironmentSlot::Specular => &mut self.specular,
        }
    }

    /// Upload the sphere and build the program.
    ///
    /// Environment textures are best effort: one that fails to upload is
    /// logged and left out, and the program is built without that lookup.
    /// A mesh or program failure leaves the renderer uninitialized.
    pub fn initialize<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        mesh: &Mesh,
        environment: &EnvironmentSources,
    ) -> RenderResult<()> {
        self.expect_state(RendererState::Uninitialized, "initialize")?;

        if let Err(e) = self.try_initialize(backend, mesh, environment) {
            log::warn!("Renderer initialization failed: {}", e);
            self.release(backend);
            return Err(e);
        }

        self.state = RendererState::Ready;
        log::debug!(
            "Renderer ready: {} indices, program '{}'",
            mesh.index_count(),
            self.capabilities().label()
        );
        Ok(())
    }

    fn try_initialize<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        mesh: &Mesh,
        environment: &EnvironmentSources,
    ) -> RenderResult<()> {
        self.mesh = Some(GpuMesh::upload(backend, mesh)?);
        self.scene = Some(create_scene_binding(backend)?);

        for slot in EnvironmentSlot::ALL {
            let Some(data) = environment.get(slot) else {
                continue;
            };
            match EnvironmentTexture::upload(backend, slot, data) {
                Ok(texture) => *self.slot_mut(slot) = Some(texture),
                Err(e) => log::warn!(
                    "Failed to upload {} '{}', rendering without it: {}",
                    slot.label(),
                    data.name,
                    e
                ),
            }
        }

        self.rebuild_program(backend)
    }

    /// Build the program for the current environment and swap it in.
    fn rebuild_program<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) -> RenderResult<()> {
        let scene_layout = self
            .scene
            .as_ref()
            .map(|s| s.layout)
            .ok_or(RenderError::InvalidState {
                operation: "build a program",
                state: self.state.name(),
            })?;

        let capabilities = self.capabilities();
        let program = ShaderProgram::build(capabilities, &self.bands)?;

        let mut layouts = vec![scene_layout];
        let mut environment_layout = None;
        let mut environment_group = None;
        if capabilities.uses_environment() {
            let (layout_entries, group_entries) = environment_entries(self.diffuse.as_ref(), self.specular.as_ref());
            let layout = backend.create_bind_group_layout(&layout_entries)?;
            match backend.create_bind_group(layout, &group_entries) {
                Ok(group) => environment_group = Some(group),
                Err(e) => {
                    backend.destroy_bind_group_layout(layout);
                    return Err(e.into());
                }
            }
            environment_layout = Some(layout);
            layouts.push(layout);
        }

        let color_format = backend.swapchain_format();
        if color_format.is_srgb() {
            log::warn!("Swapchain format {:?} encodes sRGB in hardware; output will be encoded twice", color_format);
        }

        let pipeline = backend.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(capabilities.label().to_string()),
            shader_source: program.source().to_string(),
            vertex_layouts: vec![Vertex::layout()],
            bind_group_layouts: layouts,
            primitive_topology: PrimitiveTopology::TriangleList,
            front_face: FrontFace::Ccw,
            cull_mode: CullMode::Back,
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
            }),
            color_format,
        });
        let pipeline = match pipeline {
            Ok(pipeline) => pipeline,
            Err(e) => {
                if let Some(group) = environment_group {
                    backend.destroy_bind_group(group);
                }
                if let Some(layout) = environment_layout {
                    backend.destroy_bind_group_layout(layout);
                }
                return Err(e.into());
            }
        };

        if let Some(old) = self.program.replace(ProgramResources {
            program,
            pipeline,
            environment_layout,
            environment_group,
        }) {
            destroy_program(backend, old);
        }
        log::debug!("Program rebuilt as '{}'", capabilities.label());
        Ok(())
    }

    /// Upload an environment texture that arrived after initialization and
    /// rebuild the program to read it.
    ///
    /// On failure the previous texture and program stay in place.
    pub fn attach_environment<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        slot: EnvironmentSlot,
        data: &TextureData,
    ) -> RenderResult<()> {
        self.expect_state(RendererState::Ready, "attach an environment texture")?;

        let uploaded = EnvironmentTexture::upload(backend, slot, data)?;
        let previous = self.slot_mut(slot).replace(uploaded);

        if let Err(e) = self.rebuild_program(backend) {
            if let Some(failed) = std::mem::replace(self.slot_mut(slot), previous) {
                failed.destroy(backend);
            }
            return Err(e);
        }

        if let Some(old) = previous {
            old.destroy(backend);
        }
        log::info!("Attached {} '{}'", slot.label(), data.name);
        Ok(())
    }

    /// Build this frame's uniforms from the scene and draw the sphere.
    pub fn render_frame<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        frame: &FrameContext,
        scene: &Scene,
    ) -> RenderResult<FrameUniforms> {
        self.expect_state(RendererState::Ready, "render a frame")?;
        let uniforms = FrameUniforms::build(
            &scene.camera,
            &scene.light,
            &scene.material,
            frame.aspect_ratio(),
            self.environment_bindings(),
        );
        self.draw(backend, frame, &uniforms)?;
        Ok(uniforms)
    }

    /// Clear, depth test and draw the sphere once with the given uniforms.
    ///
    /// The uniforms are checked against the program before anything is recorded.
    pub fn draw<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        frame: &FrameContext,
        uniforms: &FrameUniforms,
    ) -> RenderResult<()> {
        self.expect_state(RendererState::Ready, "draw")?;
        let (Some(program), Some(scene), Some(mesh)) = (&self.program, &self.scene, self.mesh) else {
            return Err(RenderError::InvalidState {
                operation: "draw",
                state: self.state.name(),
            });
        };
        program.program.interface().validate(uniforms)?;
        let (pipeline, environment_group) = (program.pipeline, program.environment_group);
        let (uniform_buffer, scene_group) = (scene.buffer, scene.group);

        let depth_view = self.ensure_depth(backend, frame.width, frame.height)?;

        self.state = RendererState::Rendering;
        log::trace!("Drawing {}x{} frame", frame.width, frame.height);

        backend.write_buffer(uniform_buffer, 0, bytemuck::bytes_of(&uniforms.gpu_data()));

        backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("Sphere Pass".into()),
            color_attachment: ColorAttachment {
                view: frame.swapchain_view,
                load_op: LoadOp::Clear(self.clear_color),
                store_op: StoreOp::Store,
            },
            depth_stencil_attachment: Some(DepthStencilAttachment {
                view: depth_view,
                depth_load_op: LoadOp::Clear([1.0, 0.0, 0.0, 0.0]),
                depth_store_op: StoreOp::Discard,
                depth_clear_value: 1.0,
            }),
        });
        backend.set_viewport(0.0, 0.0, frame.width as f32, frame.height as f32, 0.0, 1.0);
        backend.set_render_pipeline(pipeline);
        backend.set_bind_group(0, scene_group);
        if let Some(group) = environment_group {
            backend.set_bind_group(1, group);
        }
        backend.set_vertex_buffer(0, mesh.vertex_buffer, 0);
        backend.set_index_buffer(mesh.index_buffer, 0, IndexFormat::Uint32);
        backend.draw_indexed(0..mesh.index_count, 0, 0..1);
        backend.end_render_pass();

        self.state = RendererState::Ready;
        Ok(())
    }

    /// Depth buffer matching the frame, recreated when the frame size changes.
    fn ensure_depth<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> BackendResult<TextureViewHandle> {
        let (width, height) = (width.max(1), height.max(1));
        if let Some(depth) = &self.depth {
            if depth.width == width && depth.height == height {
                return Ok(depth.view);
            }
        }

        if let Some(old) = self.depth.take() {
            backend.destroy_texture(old.texture);
        }
        let texture = backend.create_texture(&TextureDescriptor {
            label: Some("Depth Buffer".into()),
            width,
            height,
            format: DEPTH_FORMAT,
            usage: TextureUsage::RENDER_ATTACHMENT,
        })?;
        let view = match backend.create_texture_view(texture) {
            Ok(view) => view,
            Err(e) => {
                backend.destroy_texture(texture);
                return Err(e);
            }
        };
        log::debug!("Depth buffer resized to {}x{}", width, height);
        self.depth = Some(DepthTarget {
            texture,
            view,
            width,
            height,
        });
        Ok(view)
    }

    /// Destroy every GPU resource and return to `Uninitialized`.
    pub fn release<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(program) = self.program.take() {
            destroy_program(backend, program);
        }
        for slot in EnvironmentSlot::ALL {
            if let Some(environment) = self.slot_mut(slot).take() {
                environment.destroy(backend);
            }
        }
        if let Some(depth) = self.depth.take() {
            backend.destroy_texture(depth.texture);
        }
        if let Some(scene) = self.scene.take() {
            backend.destroy_bind_group(scene.group);
            backend.destroy_bind_group_layout(scene.layout);
            backend.destroy_buffer(scene.buffer);
        }
        if let Some(mesh) = self.mesh.take() {
            backend.destroy_buffer(mesh.vertex_buffer);
            backend.destroy_buffer(mesh.index_buffer);
        }
        self.state = RendererState::Uninitialized;
    }
}

fn create_scene_binding<B: GraphicsBackend + ?Sized>(backend: &mut B) -> BackendResult<SceneBinding> {
    let buffer = backend.create_buffer(&BufferDescriptor {
        label: Some("Scene Uniforms".into()),
        size: SceneUniformData::SIZE,
        usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
    })?;
    let layout = match backend.create_bind_group_layout(&[BindGroupLayoutEntry {
        binding: 0,
        visibility: ShaderStageFlags::VERTEX_FRAGMENT,
        ty: BindingType::UniformBuffer,
    }]) {
        Ok(layout) => layout,
        Err(e) => {
            backend.destroy_buffer(buffer);
            return Err(e);
        }
    };
    let group = backend.create_bind_group(
        layout,
        &[(
            0,
            BindGroupEntry::Buffer {
                buffer,
                offset: 0,
                size: Some(SceneUniformData::SIZE),
            },
        )],
    );
    let group = match group {
        Ok(group) => group,
        Err(e) => {
            backend.destroy_bind_group_layout(layout);
            backend.destroy_buffer(buffer);
            return Err(e);
        }
    };
    Ok(SceneBinding {
        buffer,
        layout,
        group,
    })
}

/// Layout and bind group entries for group 1; each slot owns a fixed
/// sampler/texture binding pair whether or not the other slot is present.
fn environment_entries(
    diffuse: Option<&EnvironmentTexture>,
    specular: Option<&EnvironmentTexture>,
) -> (Vec<BindGroupLayoutEntry>, Vec<(u32, BindGroupEntry)>) {
    let mut layout = Vec::new();
    let mut group = Vec::new();
    for (first_binding, environment) in [(0, diffuse), (2, specular)] {
        let Some(environment) = environment else {
            continue;
        };
        layout.push(BindGroupLayoutEntry {
            binding: first_binding,
            visibility: ShaderStageFlags::FRAGMENT,
            ty: BindingType::Sampler { filtering: true },
        });
        layout.push(BindGroupLayoutEntry {
            binding: first_binding + 1,
            visibility: ShaderStageFlags::FRAGMENT,
            ty: BindingType::Texture { filterable: true },
        });
        group.push((first_binding, BindGroupEntry::Sampler(environment.sampler)));
        group.push((first_binding + 1, BindGroupEntry::Texture(environment.texture.view)));
    }
    (layout, group)
}

fn destroy_program<B: GraphicsBackend + ?Sized>(backend: &mut B, program: ProgramResources) {
    backend.destroy_render_pipeline(program.pipeline);
    if let Some(group) = program.environment_group {
        backend.destroy_bind_group(group);
    }
    if let Some(layout) = program.environment_layout {
        backend.destroy_bind_group_layout(layout);
    }
}
