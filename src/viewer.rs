//! Interactive viewer: window events in, one shaded frame out.

use std::sync::Arc;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use crate::backend::traits::*;
use crate::backend::wgpu_backend::WgpuBackend;
use crate::error::RenderResult;
use crate::panel::ParameterPanel;
use crate::renderer::FrameRenderer;
use crate::resources::{EnvironmentSlot, EnvironmentSources, Mesh, TextureData};
use crate::scene::{CameraController, CameraInput, CameraMove, ControlState, DragController, Scene};
use crate::RendererConfig;

/// What the event loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResponse {
    Continue,
    Exit,
}

/// Owns the backend, the renderer and all interactive state
pub struct Viewer {
    window: Arc<Window>,
    backend: WgpuBackend,
    renderer: FrameRenderer,
    panel: ParameterPanel,
    scene: Scene,
    controls: ControlState,
    camera_input: CameraInput,
    controller: DragController,
    last_cursor: Option<Vec2>,
    frame_count: u64,
}

impl Viewer {
    /// Create the backend on `window`, upload the sphere and whatever
    /// environment maps loaded successfully.
    pub fn new(
        window: Arc<Window>,
        config: &RendererConfig,
        environment: &EnvironmentSources,
    ) -> RenderResult<Self> {
        let mut backend = WgpuBackend::new(Arc::clone(&window), config.vsync)?;
        let size = window.inner_size();
        backend.resize(size.width.max(1), size.height.max(1));

        let mut renderer = FrameRenderer::new(config);
        let mesh = Mesh::sphere(config.sphere_segments, config.sphere_rings);
        renderer.initialize(&mut backend, &mesh, environment)?;

        let mut panel = ParameterPanel::new(&backend, &window);
        let (surface_width, surface_height) = backend.surface_size();
        panel.set_surface_scale(size.width, size.height, surface_width, surface_height);

        log::info!(
            "Viewer ready ({}x{}, {})",
            surface_width,
            surface_height,
            renderer.capabilities().label()
        );

        Ok(Self {
            window,
            backend,
            renderer,
            panel,
            scene: Scene::new(config),
            controls: ControlState::default(),
            camera_input: CameraInput::new(),
            controller: DragController::new(),
            last_cursor: None,
            frame_count: 0,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    /// Hand over an environment map that finished loading after startup.
    pub fn attach_environment(&mut self, slot: EnvironmentSlot, data: &TextureData) -> RenderResult<()> {
        self.renderer.attach_environment(&mut self.backend, slot, data)
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> EventResponse {
        let consumed = self.panel.on_window_event(&self.window, event);

        match event {
            WindowEvent::CloseRequested => return EventResponse::Exit,
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::KeyboardInput { event, .. } if !consumed => {
                if event.state != ElementState::Pressed {
                    return EventResponse::Continue;
                }
                if let PhysicalKey::Code(key) = event.physical_key {
                    match key {
                        KeyCode::F1 if !event.repeat => self.panel.toggle_visibility(),
                        KeyCode::Escape => return EventResponse::Exit,
                        _ => {
                            if let Some(step) = CameraMove::from_key(key) {
                                self.camera_input.push_move(step);
                            }
                        }
                    }
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let pressed = *state == ElementState::Pressed;
                self.camera_input.dragging = pressed && !self.panel.wants_pointer_input();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if let Some(last) = self.last_cursor {
                    self.camera_input.add_pointer_motion(position - last);
                }
                self.last_cursor = Some(position);
            }
            WindowEvent::CursorLeft { .. } => self.last_cursor = None,
            WindowEvent::Focused(false) => self.camera_input = CameraInput::new(),
            _ => {}
        }
        EventResponse::Continue
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.backend.resize(width, height);
        let (surface_width, surface_height) = self.backend.surface_size();
        self.panel
            .set_surface_scale(width, height, surface_width, surface_height);
    }

    /// Apply the gathered input and the panel snapshot to the scene.
    pub fn update(&mut self) {
        self.controller.update(&mut self.scene.camera, &self.camera_input);
        self.camera_input.reset_deltas();
        self.scene.apply_controls(&self.controls);
    }

    /// Draw the sphere, then the panel, then present.
    pub fn render(&mut self) -> RenderResult<()> {
        let frame = match self.backend.begin_frame() {
            Ok(frame) => frame,
            Err(BackendError::SurfaceLost) => {
                let size = self.window.inner_size();
                log::warn!("Surface lost, reconfiguring at {}x{}", size.width, size.height);
                self.resize(size.width, size.height);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let capabilities = self.renderer.capabilities();
        if self.panel.run(&self.window, &mut self.controls, capabilities) {
            self.scene.apply_controls(&self.controls);
        }

        self.renderer
            .render_frame(&mut self.backend, &frame, &self.scene)?;
        self.panel
            .render(&mut self.backend, frame.swapchain_view, frame.width, frame.height);
        self.backend.end_frame()?;

        self.frame_count += 1;
        if self.frame_count == 1 {
            log::debug!("First frame presented");
        }
        Ok(())
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.renderer.release(&mut self.backend);
    }
}
