//! Interactive PBR sphere viewer
//!
//! Run with:
//!   cargo run --example viewer -- --diffuse env_diffuse.png --specular env_specular.png
//!
//! Controls:
//!   W/Z/Up, S/Down   - Move camera forward/back
//!   A/Q/Left, D/Right - Move camera left/right
//!   Left mouse drag  - Rotate camera
//!   F1               - Toggle parameter panel
//!   Escape           - Exit

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use pbr_viewer::resources::EnvironmentSources;
use pbr_viewer::viewer::{EventResponse, Viewer};
use pbr_viewer::RendererConfig;
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    window::WindowBuilder,
};

#[derive(Parser, Debug)]
#[command(
    name = "PBR Sphere Viewer",
    about = "Shades a sphere with a point light and image-based lighting"
)]
struct Args {
    /// Initial window width in pixels.
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value = "720")]
    height: u32,

    /// Diffuse irradiance map (equirectangular, sRGB, alpha = intensity).
    #[arg(long)]
    diffuse: Option<PathBuf>,

    /// Specular roughness-band atlas (sRGB, alpha = intensity).
    #[arg(long)]
    specular: Option<PathBuf>,

    /// Disable vertical sync (may cause tearing).
    #[arg(long)]
    no_vsync: bool,

    /// Roughness bands in the specular atlas.
    #[arg(long, default_value = "5")]
    bands: u32,

    /// Exit after rendering N frames (useful for testing).
    #[arg(long)]
    max_frames: Option<u64>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = RendererConfig {
        width: args.width,
        height: args.height,
        vsync: !args.no_vsync,
        band_count: args.bands,
        ..Default::default()
    };

    let environment = EnvironmentSources::load(args.diffuse.as_deref(), args.specular.as_deref());

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .build(&event_loop)
            .expect("Failed to create window"),
    );

    let mut viewer = match Viewer::new(Arc::clone(&window), &config, &environment) {
        Ok(viewer) => viewer,
        Err(e) => {
            eprintln!("Failed to create viewer: {}", e);
            return;
        }
    };

    let mut frames = 0u64;
    event_loop
        .run(move |event, elwt: &EventLoopWindowTarget<()>| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent {
                    event: WindowEvent::RedrawRequested,
                    ..
                } => {
                    viewer.update();
                    if let Err(e) = viewer.render() {
                        log::error!("Frame failed: {}", e);
                        elwt.exit();
                        return;
                    }
                    frames += 1;
                    if args.max_frames.is_some_and(|max| frames >= max) {
                        elwt.exit();
                    }
                }
                Event::WindowEvent { event, .. } => {
                    if viewer.handle_window_event(&event) == EventResponse::Exit {
                        elwt.exit();
                    }
                }
                Event::AboutToWait => viewer.request_redraw(),
                _ => {}
            }
        })
        .expect("Event loop failed");
}
