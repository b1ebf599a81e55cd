//! Dummy GPU backend for testing.
//!
//! Performs no GPU work. Every call is recorded so tests can inspect the
//! resources the renderer created and the commands a frame issued.

use std::collections::HashMap;

use crate::backend::traits::*;
use crate::backend::types::*;

/// A render command captured between `begin_render_pass` and `end_render_pass`.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    BeginRenderPass {
        label: Option<String>,
        clear_color: Option<[f32; 4]>,
        has_depth: bool,
    },
    EndRenderPass,
    SetPipeline(RenderPipelineHandle),
    SetBindGroup { index: u32, bind_group: BindGroupHandle },
    SetVertexBuffer { slot: u32, buffer: BufferHandle },
    SetIndexBuffer { buffer: BufferHandle, format: IndexFormat },
    SetViewport { width: f32, height: f32 },
    DrawIndexed { indices: std::ops::Range<u32>, instances: std::ops::Range<u32> },
}

/// A texture as the dummy backend sees it.
#[derive(Debug, Clone)]
pub struct DummyTexture {
    pub descriptor: TextureDescriptor,
    pub data: Option<Vec<u8>>,
}

/// A pipeline as the dummy backend sees it.
#[derive(Debug, Clone)]
pub struct DummyPipeline {
    pub label: Option<String>,
    pub shader_source: String,
    pub bind_group_layouts: Vec<BindGroupLayoutHandle>,
}

/// Failures the dummy backend can be told to report.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureInjection {
    pub begin_frame: bool,
    pub create_pipeline: bool,
    pub create_texture: bool,
}

/// Recording backend.
#[derive(Debug)]
pub struct DummyBackend {
    width: u32,
    height: u32,
    format: TextureFormat,
    next_id: u64,
    in_frame: bool,
    in_pass: bool,
    frames_presented: u32,
    pub failures: FailureInjection,
    buffers: HashMap<u64, Vec<u8>>,
    textures: HashMap<u64, DummyTexture>,
    views: HashMap<u64, u64>,
    samplers: HashMap<u64, SamplerDescriptor>,
    layouts: HashMap<u64, Vec<BindGroupLayoutEntry>>,
    bind_groups: HashMap<u64, Vec<(u32, BindGroupEntry)>>,
    pipelines: HashMap<u64, DummyPipeline>,
    commands: Vec<RecordedCommand>,
}

impl DummyBackend {
    /// Create a new dummy backend with the given surface size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            format: TextureFormat::Bgra8Unorm,
            next_id: 1,
            in_frame: false,
            in_pass: false,
            frames_presented: 0,
            failures: FailureInjection::default(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            views: HashMap::new(),
            samplers: HashMap::new(),
            layouts: HashMap::new(),
            bind_groups: HashMap::new(),
            pipelines: HashMap::new(),
            commands: Vec::new(),
        }
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn record(&mut self, command: RecordedCommand) {
        if self.in_pass {
            self.commands.push(command);
        } else {
            log::warn!("DummyBackend: {:?} issued outside of a render pass", command);
        }
    }

    /// Commands recorded since the last [`DummyBackend::clear_commands`].
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn frames_presented(&self) -> u32 {
        self.frames_presented
    }

    /// Current contents of a buffer.
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer.0).map(Vec::as_slice)
    }

    pub fn texture(&self, texture: TextureHandle) -> Option<&DummyTexture> {
        self.textures.get(&texture.0)
    }

    /// The texture a view was created from.
    pub fn view_texture(&self, view: TextureViewHandle) -> Option<&DummyTexture> {
        self.views
            .get(&view.0)
            .and_then(|texture| self.textures.get(texture))
    }

    pub fn sampler(&self, sampler: SamplerHandle) -> Option<&SamplerDescriptor> {
        self.samplers.get(&sampler.0)
    }

    pub fn pipeline(&self, pipeline: RenderPipelineHandle) -> Option<&DummyPipeline> {
        self.pipelines.get(&pipeline.0)
    }

    pub fn bind_group_entries(&self, bind_group: BindGroupHandle) -> Option<&[(u32, BindGroupEntry)]> {
        self.bind_groups.get(&bind_group.0).map(Vec::as_slice)
    }

    pub fn layout_entries(&self, layout: BindGroupLayoutHandle) -> Option<&[BindGroupLayoutEntry]> {
        self.layouts.get(&layout.0).map(Vec::as_slice)
    }

    pub fn live_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_bind_groups(&self) -> usize {
        self.bind_groups.len()
    }

    pub fn live_samplers(&self) -> usize {
        self.samplers.len()
    }

    pub fn live_layouts(&self) -> usize {
        self.layouts.len()
    }
}

impl GraphicsBackend for DummyBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        if self.failures.begin_frame {
            return Err(BackendError::SurfaceLost);
        }
        self.in_frame = true;
        let id = self.allocate_id();
        Ok(FrameContext {
            swapchain_view: TextureViewHandle(id),
            width: self.width,
            height: self.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if self.in_frame {
            self.frames_presented += 1;
        }
        self.in_frame = false;
        Ok(())
    }

    fn swapchain_format(&self) -> TextureFormat {
        self.format
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            desc.label,
            desc.size
        );
        let id = self.allocate_id();
        self.buffers.insert(id, vec![0; desc.size as usize]);
        Ok(BufferHandle(id))
    }

    fn create_buffer_init(
        &mut self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> BackendResult<BufferHandle> {
        log::trace!(
            "DummyBackend: creating buffer {:?} with {} bytes",
            desc.label,
            data.len()
        );
        let id = self.allocate_id();
        self.buffers.insert(id, data.to_vec());
        Ok(BufferHandle(id))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        let Some(contents) = self.buffers.get_mut(&buffer.0) else {
            log::warn!("DummyBackend: write to unknown buffer {:?}", buffer);
            return;
        };
        let start = offset as usize;
        let end = start + data.len();
        if contents.len() < end {
            contents.resize(end, 0);
        }
        contents[start..end].copy_from_slice(data);
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        if self.failures.create_texture {
            return Err(BackendError::TextureCreationFailed(
                "injected failure".into(),
            ));
        }
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{})",
            desc.label,
            desc.width,
            desc.height
        );
        let id = self.allocate_id();
        self.textures.insert(
            id,
            DummyTexture {
                descriptor: desc.clone(),
                data: None,
            },
        );
        Ok(TextureHandle(id))
    }

    fn create_texture_view(&mut self, texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        if !self.textures.contains_key(&texture.0) {
            return Err(BackendError::InvalidHandle(format!("{:?}", texture)));
        }
        let id = self.allocate_id();
        self.views.insert(id, texture.0);
        Ok(TextureViewHandle(id))
    }

    fn write_texture(&mut self, texture: TextureHandle, data: &[u8], _width: u32, _height: u32) {
        if let Some(tex) = self.textures.get_mut(&texture.0) {
            tex.data = Some(data.to_vec());
        }
    }

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> BackendResult<SamplerHandle> {
        log::trace!("DummyBackend: creating sampler {:?}", desc.label);
        let id = self.allocate_id();
        self.samplers.insert(id, desc.clone());
        Ok(SamplerHandle(id))
    }

    fn create_bind_group_layout(
        &mut self,
        entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle> {
        let id = self.allocate_id();
        self.layouts.insert(id, entries.to_vec());
        Ok(BindGroupLayoutHandle(id))
    }

    fn create_bind_group(
        &mut self,
        layout: BindGroupLayoutHandle,
        entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        let layout_entries = self
            .layouts
            .get(&layout.0)
            .ok_or_else(|| BackendError::InvalidHandle(format!("{:?}", layout)))?;
        if layout_entries.len() != entries.len() {
            return Err(BackendError::PipelineCreationFailed(format!(
                "bind group has {} entries, layout expects {}",
                entries.len(),
                layout_entries.len()
            )));
        }
        let id = self.allocate_id();
        self.bind_groups.insert(id, entries.to_vec());
        Ok(BindGroupHandle(id))
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        if self.failures.create_pipeline {
            return Err(BackendError::PipelineCreationFailed(
                "injected failure".into(),
            ));
        }
        log::trace!("DummyBackend: creating pipeline {:?}", desc.label);
        let id = self.allocate_id();
        self.pipelines.insert(
            id,
            DummyPipeline {
                label: desc.label.clone(),
                shader_source: desc.shader_source.clone(),
                bind_group_layouts: desc.bind_group_layouts.clone(),
            },
        );
        Ok(RenderPipelineHandle(id))
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        self.in_pass = true;
        let clear_color = match desc.color_attachment.load_op {
            LoadOp::Clear(color) => Some(color),
            LoadOp::Load => None,
        };
        self.record(RecordedCommand::BeginRenderPass {
            label: desc.label.clone(),
            clear_color,
            has_depth: desc.depth_stencil_attachment.is_some(),
        });
    }

    fn end_render_pass(&mut self) {
        self.record(RecordedCommand::EndRenderPass);
        self.in_pass = false;
    }

    fn set_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.record(RecordedCommand::SetPipeline(pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupHandle) {
        self.record(RecordedCommand::SetBindGroup { index, bind_group });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle, _offset: u64) {
        self.record(RecordedCommand::SetVertexBuffer { slot, buffer });
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, _offset: u64, format: IndexFormat) {
        self.record(RecordedCommand::SetIndexBuffer { buffer, format });
    }

    fn set_viewport(&mut self, _x: f32, _y: f32, width: f32, height: f32, _min_depth: f32, _max_depth: f32) {
        self.record(RecordedCommand::SetViewport { width, height });
    }

    fn draw_indexed(
        &mut self,
        indices: std::ops::Range<u32>,
        _base_vertex: i32,
        instances: std::ops::Range<u32>,
    ) {
        self.record(RecordedCommand::DrawIndexed { indices, instances });
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture.0);
        self.views.retain(|_, owner| *owner != texture.0);
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) {
        self.samplers.remove(&sampler.0);
    }

    fn destroy_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.pipelines.remove(&pipeline.0);
    }

    fn destroy_bind_group(&mut self, bind_group: BindGroupHandle) {
        self.bind_groups.remove(&bind_group.0);
    }

    fn destroy_bind_group_layout(&mut self, layout: BindGroupLayoutHandle) {
        self.layouts.remove(&layout.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_writes_land_at_offset() {
        let mut backend = DummyBackend::new(4, 4);
        let buffer = backend
            .create_buffer(&BufferDescriptor {
                label: None,
                size: 8,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            })
            .unwrap();
        backend.write_buffer(buffer, 4, &[1, 2, 3, 4]);
        assert_eq!(backend.buffer_data(buffer), Some(&[0, 0, 0, 0, 1, 2, 3, 4][..]));
    }

    #[test]
    fn commands_outside_a_pass_are_dropped() {
        let mut backend = DummyBackend::new(4, 4);
        backend.set_viewport(0.0, 0.0, 4.0, 4.0, 0.0, 1.0);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn destroying_a_texture_drops_its_views() {
        let mut backend = DummyBackend::new(4, 4);
        let texture = backend.create_texture(&TextureDescriptor::default()).unwrap();
        let view = backend.create_texture_view(texture).unwrap();
        backend.destroy_texture(texture);
        assert!(backend.view_texture(view).is_none());
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn destroyed_samplers_and_layouts_are_forgotten() {
        let mut backend = DummyBackend::new(4, 4);
        let sampler = backend.create_sampler(&SamplerDescriptor::default()).unwrap();
        let layout = backend.create_bind_group_layout(&[]).unwrap();
        assert_eq!((backend.live_samplers(), backend.live_layouts()), (1, 1));
        backend.destroy_sampler(sampler);
        backend.destroy_bind_group_layout(layout);
        assert!(backend.sampler(sampler).is_none());
        assert!(backend.layout_entries(layout).is_none());
        assert_eq!((backend.live_samplers(), backend.live_layouts()), (0, 0));
    }

    #[test]
    fn injected_begin_frame_failure() {
        let mut backend = DummyBackend::new(4, 4);
        backend.failures.begin_frame = true;
        assert!(matches!(backend.begin_frame(), Err(BackendError::SurfaceLost)));
    }
}
