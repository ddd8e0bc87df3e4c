//! Tandem Desktop — producer and consumer scenes in two native windows.
//!
//! Uses `winit` 0.30 for windowing and input and `tandem-render` for GPU
//! rendering. Rendering happens on the render loop's own thread(s); the
//! event loop only forwards commands.
//!
//! Keys: `Space` pauses/resumes the clock, `V` toggles consumer vsync,
//! `Escape` quits.

mod pipeline;

use log::info;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowId,
};

use tandem_core::PipelineConfig;

use pipeline::Pipeline;

/// Winit 0.30 application handler.
struct App {
    config: PipelineConfig,
    pipeline: Option<Pipeline>,
}

impl App {
    fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            pipeline: None,
        }
    }

    fn quit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.shutdown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.pipeline.is_some() {
            return; // Already initialized.
        }

        match Pipeline::start(event_loop, &self.config) {
            Ok(pipeline) => self.pipeline = Some(pipeline),
            Err(e) => {
                log::error!("Startup failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(pipeline) = self.pipeline.as_ref() else {
            return;
        };
        if !pipeline.owns(window_id) {
            return;
        }

        match event {
            // ── Close / Escape ──────────────────────────────────
            WindowEvent::CloseRequested => {
                info!("Window closed; shutting down");
                self.quit(event_loop);
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                match event.logical_key {
                    Key::Named(NamedKey::Escape) => self.quit(event_loop),
                    Key::Named(NamedKey::Space) => {
                        pipeline.context().toggle_pause();
                    }
                    Key::Character(ref c) if c.eq_ignore_ascii_case("v") => {
                        pipeline.context().toggle_vsync();
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    info!("Starting Tandem Desktop...");

    let config = match PipelineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {e}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {e}");
    }
}
