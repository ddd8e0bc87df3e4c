//! Startup and shutdown of the two-window pipeline.
//!
//! `Pipeline` owns both windows and the render loop. Both scenes share one
//! wgpu device so the consumer can import the producer's surfaces.

use std::sync::Arc;

use thiserror::Error;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event_loop::ActiveEventLoop,
    window::{Window, WindowAttributes, WindowId},
};

use tandem_core::{
    CoreError, PipelineConfig, RenderContext, RenderLoop, Scene, NO_VSYNC,
};
use tandem_render::{
    ConsumerScene, GpuContext, GpuDevice, GpuError, ProducerScene, ShareRegistry,
    SharedTextures,
};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Gap between the two windows, in physical pixels.
const WINDOW_GAP: u32 = 16;

pub struct Pipeline {
    producer_window: Arc<Window>,
    consumer_window: Arc<Window>,
    ctx: RenderContext,
    render_loop: Option<RenderLoop>,
}

impl Pipeline {
    /// Open both windows, create the scenes and start rendering.
    pub fn start(
        event_loop: &ActiveEventLoop,
        config: &PipelineConfig,
    ) -> Result<Self, StartupError> {
        let size = PhysicalSize::new(config.width, config.height);
        let producer_window = Arc::new(event_loop.create_window(
            window_attributes("Tandem — producer", size, PhysicalPosition::new(40, 40)),
        )?);
        let consumer_window = Arc::new(event_loop.create_window(window_attributes(
            "Tandem — consumer",
            size,
            PhysicalPosition::new(40 + (config.width + WINDOW_GAP) as i32, 40),
        ))?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let producer_surface = instance.create_surface(Arc::clone(&producer_window))?;
        let consumer_surface = instance.create_surface(Arc::clone(&consumer_window))?;
        let gpu = pollster::block_on(GpuDevice::request(&instance, Some(&producer_surface)))?;

        let registry: SharedTextures = Arc::new(ShareRegistry::new());
        let producer = ProducerScene::new(
            GpuContext::with_surface(
                Arc::clone(&gpu),
                producer_surface,
                config.width,
                config.height,
                NO_VSYNC,
            )?,
            Arc::clone(&registry),
            config,
        )?;
        let consumer = ConsumerScene::new(
            GpuContext::with_surface(
                gpu,
                consumer_surface,
                config.width,
                config.height,
                config.consumer_sync_interval(),
            )?,
            producer.queue(),
            registry,
            config,
        );

        log::info!(
            "Tandem initialized: {}x{}, pool of {}, GPU: {}",
            config.width,
            config.height,
            config.pool_size,
            producer.gpu()
        );

        let ctx = RenderContext::new(config.vsync);
        let render_loop = RenderLoop::spawn(
            ctx.clone(),
            config.mode,
            Box::new(producer),
            Box::new(consumer),
        )?;

        Ok(Self {
            producer_window,
            consumer_window,
            ctx,
            render_loop: Some(render_loop),
        })
    }

    pub fn owns(&self, id: WindowId) -> bool {
        id == self.producer_window.id() || id == self.consumer_window.id()
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Stop the render thread(s), then release both scenes' GPU state here
    /// while the windows are still alive.
    pub fn shutdown(&mut self) {
        if let Some(render_loop) = self.render_loop.take() {
            let scenes = render_loop.shutdown();
            log::info!("Releasing {} scene(s)", scenes.len());
            drop(scenes);
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn window_attributes(
    title: &str,
    size: PhysicalSize<u32>,
    position: PhysicalPosition<i32>,
) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(title)
        .with_inner_size(size)
        .with_position(position)
        .with_resizable(false)
}
