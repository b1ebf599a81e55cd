//! Parameter panel drawn with egui on top of the sphere pass.

use egui::ViewportId;
use egui_wgpu::ScreenDescriptor;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::backend::traits::TextureViewHandle;
use crate::backend::wgpu_backend::WgpuBackend;
use crate::scene::ControlState;
use crate::shader::ShadingCapabilities;

/// egui state, input translation and wgpu painting for the parameter window
pub struct ParameterPanel {
    ctx: egui::Context,
    winit_state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    paint_jobs: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    /// Surface size over window size, when the device clamped the surface
    input_scale: f32,
    visible: bool,
}

impl ParameterPanel {
    pub fn new(backend: &WgpuBackend, window: &Window) -> Self {
        let ctx = egui::Context::default();
        let winit_state = egui_winit::State::new(
            ctx.clone(),
            ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
        );
        let renderer = egui_wgpu::Renderer::new(
            backend.device(),
            backend.wgpu_surface_format(),
            None,
            1,
        );

        Self {
            ctx,
            winit_state,
            renderer,
            paint_jobs: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
            input_scale: 1.0,
            visible: true,
        }
    }

    pub fn set_surface_scale(
        &mut self,
        window_width: u32,
        window_height: u32,
        surface_width: u32,
        surface_height: u32,
    ) {
        let scale_x = surface_width as f32 / window_width.max(1) as f32;
        let scale_y = surface_height as f32 / window_height.max(1) as f32;
        self.input_scale = scale_x.min(scale_y);
    }

    /// Feed a window event to egui; returns whether egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let scaled = match event {
            WindowEvent::CursorMoved {
                device_id,
                position,
            } if self.input_scale != 1.0 => Some(WindowEvent::CursorMoved {
                device_id: *device_id,
                position: winit::dpi::PhysicalPosition::new(
                    position.x * self.input_scale as f64,
                    position.y * self.input_scale as f64,
                ),
            }),
            _ => None,
        };
        self.winit_state
            .on_window_event(window, scaled.as_ref().unwrap_or(event))
            .consumed
    }

    /// Run the panel for one frame, editing `controls` in place.
    ///
    /// Returns whether any control changed.
    pub fn run(
        &mut self,
        window: &Window,
        controls: &mut ControlState,
        capabilities: ShadingCapabilities,
    ) -> bool {
        let mut raw_input = self.winit_state.take_egui_input(window);
        if self.input_scale != 1.0 {
            if let Some(rect) = &mut raw_input.screen_rect {
                rect.max.x *= self.input_scale;
                rect.max.y *= self.input_scale;
            }
        }

        self.ctx.begin_frame(raw_input);
        let changed = self.visible && show_controls(&self.ctx, controls, capabilities);
        let full_output = self.ctx.end_frame();

        self.winit_state
            .handle_platform_output(window, full_output.platform_output);
        self.paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        self.textures_delta = full_output.textures_delta;
        changed
    }

    /// Paint the last frame's output over the swapchain image.
    pub fn render(
        &mut self,
        backend: &mut WgpuBackend,
        swapchain_view: TextureViewHandle,
        screen_width: u32,
        screen_height: u32,
    ) {
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [screen_width, screen_height],
            pixels_per_point: self.ctx.pixels_per_point(),
        };

        let (device, queue, encoder) = backend.device_queue_encoder();
        for (id, image_delta) in &self.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }
        if let Some(encoder) = encoder {
            self.renderer.update_buffers(
                device,
                queue,
                encoder,
                &self.paint_jobs,
                &screen_descriptor,
            );
        }

        backend.render_egui(
            &self.renderer,
            &self.paint_jobs,
            &screen_descriptor,
            swapchain_view,
        );

        for id in &self.textures_delta.free {
            self.renderer.free_texture(id);
        }
        self.textures_delta = egui::TexturesDelta::default();
    }

    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    pub fn wants_keyboard_input(&self) -> bool {
        self.ctx.wants_keyboard_input()
    }

    pub fn wants_pointer_input(&self) -> bool {
        self.ctx.wants_pointer_input()
    }
}

/// The parameter window. Returns whether any control changed.
pub fn show_controls(
    ctx: &egui::Context,
    controls: &mut ControlState,
    capabilities: ShadingCapabilities,
) -> bool {
    let mut changed = false;

    egui::Window::new("Parameters")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading("Material");
            ui.separator();
            ui.horizontal(|ui| {
                ui.label("Albedo:");
                changed |= ui.color_edit_button_srgb(&mut controls.albedo).changed();
            });
            changed |= ui
                .add(egui::Slider::new(&mut controls.metallic, 0.0..=1.0).text("Metallic"))
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut controls.roughness, 0.0..=1.0).text("Roughness"))
                .changed();

            ui.add_space(10.0);
            ui.heading("Light");
            ui.separator();
            changed |= ui
                .add(egui::Slider::new(&mut controls.light_coordinate[0], 0..=255).text("X"))
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut controls.light_coordinate[1], 0..=255).text("Y"))
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(
                        &mut controls.light_strength,
                        0.0..=ControlState::MAX_LIGHT_STRENGTH,
                    )
                    .text("Strength"),
                )
                .changed();

            ui.add_space(10.0);
            ui.heading("Environment");
            ui.separator();
            ui.label(format!(
                "Diffuse IBL: {}",
                if capabilities.diffuse_ibl { "on" } else { "off" }
            ));
            ui.label(format!(
                "Specular IBL: {}",
                if capabilities.specular_ibl { "on" } else { "off" }
            ));
        });

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_without_input_leaves_controls_alone() {
        let ctx = egui::Context::default();
        let mut controls = ControlState::default();
        let mut changed = true;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            changed = show_controls(ctx, &mut controls, ShadingCapabilities::FULL);
        });
        assert!(!changed);
        assert_eq!(controls, ControlState::default());
    }
}
