//! Consumer scene — shows the producer's latest frame in its own window.
//!
//! ```text
//!  consume ─► import (cached per handle) ─► draw quad ─► submit ─► checkin
//! ```
//!
//! The surface is checked in only after the draw that samples it has been
//! submitted. Both contexts submit to the same device queue, so any later
//! producer write to that surface executes after this read.

use std::sync::Arc;
use std::time::Duration;

use wgpu::{
    BindGroup, BlendState, CommandEncoderDescriptor, Extent3d, LoadOp, Operations,
    RenderPassColorAttachment, RenderPassDescriptor, StoreOp, SurfaceTexture, TextureDescriptor,
    TextureDimension, TextureUsages, TextureView, TextureViewDescriptor,
};

use tandem_core::{
    Background, Console, FpsCounter, Overlay, PipelineConfig, Scene, ShareHandle,
    SharedSurfaceQueue,
};

use crate::context::GpuContext;
use crate::import::ImportCache;
use crate::pipelines::{clear_color, QuadPipeline, RectPipeline};
use crate::shapes;
use crate::share::SharedTextures;
use crate::vertex::RectInstance;

/// Checkerboard cell size in pixels.
pub const CHECKER_CELL: u32 = 16;

/// Console line carrying the adapter name.
pub const LINE_GPU: usize = 0;
/// Console line carrying the frame rate.
pub const LINE_FPS: usize = 1;

pub struct ConsumerScene {
    ctx: GpuContext,
    queue: SharedSurfaceQueue,
    registry: SharedTextures,
    imports: ImportCache<BindGroup>,
    gpu_name: String,

    rects: RectPipeline,
    quad: QuadPipeline,
    /// Stand-in target when the context has no window.
    offscreen: Option<TextureView>,

    background: Background,
    checker: Vec<RectInstance>,
    pending: Option<SurfaceTexture>,

    consume_timeout: Duration,
    fps: FpsCounter,
    console: Console,
    displayed: u64,
    dropped: u64,
    last_shown: Option<ShareHandle>,
}

impl ConsumerScene {
    /// Wire a consumer to `queue`, importing its surfaces from `registry`.
    pub fn new(
        ctx: GpuContext,
        queue: SharedSurfaceQueue,
        registry: SharedTextures,
        config: &PipelineConfig,
    ) -> Self {
        let rects = RectPipeline::new(ctx.device(), ctx.surface_format);
        let quad = QuadPipeline::new(ctx.device(), ctx.surface_format, BlendState::ALPHA_BLENDING);
        let offscreen = ctx.is_headless().then(|| create_offscreen(&ctx));
        let gpu_name = ctx.gpu().adapter_name();
        log::info!("Consumer scene {}x{} on {gpu_name}", ctx.width(), ctx.height());

        let mut scene = Self {
            ctx,
            queue,
            registry,
            imports: ImportCache::new(),
            gpu_name,
            rects,
            quad,
            offscreen,
            background: Background::default(),
            checker: Vec::new(),
            pending: None,
            consume_timeout: config.consume_timeout,
            fps: FpsCounter::new(),
            console: Console::new(),
            displayed: 0,
            dropped: 0,
            last_shown: None,
        };
        scene.set_background(&config.consumer_background);
        scene.console.write(LINE_GPU, &scene.gpu_name);
        scene
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn fps(&self) -> &FpsCounter {
        &self.fps
    }

    /// Frames drawn from an imported surface.
    pub fn displayed(&self) -> u64 {
        self.displayed
    }

    /// Frames consumed but not drawn: the import failed or no window
    /// image was available.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Whether a drawn window image is waiting for `present`.
    pub fn has_pending_present(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_shown(&self) -> Option<ShareHandle> {
        self.last_shown
    }

    pub fn imports(&self) -> &ImportCache<BindGroup> {
        &self.imports
    }

    pub fn background(&self) -> Background {
        self.background
    }
}

impl Scene for ConsumerScene {
    fn gpu(&self) -> String {
        self.gpu_name.clone()
    }

    fn width(&self) -> u32 {
        self.ctx.width()
    }

    fn height(&self) -> u32 {
        self.ctx.height()
    }

    fn set_background(&mut self, spec: &str) {
        self.background = Background::parse(spec);
        self.checker = if self.background.pattern {
            shapes::checkerboard(self.ctx.width(), self.ctx.height(), CHECKER_CELL)
        } else {
            Vec::new()
        };
    }

    fn tick(&mut self, seconds: f64) {
        self.fps.frame(seconds);
        self.console
            .write(LINE_FPS, &format!("{:.1} fps", self.fps.fps()));
    }

    fn render(&mut self) {
        // Nothing due: the last presented image stays up.
        let Some(surface) = self.queue.consume(self.consume_timeout) else {
            return;
        };

        let requester = self.ctx.gpu().id();
        let registry = &self.registry;
        let quad = &self.quad;
        let device = self.ctx.device();
        let Some(binding) = self.imports.resolve_with(surface.share_handle(), |handle| {
            let texture = registry.open(handle, requester)?;
            let view = texture.create_view(&TextureViewDescriptor::default());
            Ok(quad.bind(device, &view))
        }) else {
            self.dropped += 1;
            self.queue.checkin(surface);
            return;
        };

        let window = self.ctx.acquire_frame();
        let window_view = window
            .as_ref()
            .map(|f| f.texture.create_view(&TextureViewDescriptor::default()));
        let Some(target) = window_view.as_ref().or(self.offscreen.as_ref()) else {
            log::debug!("No window image; dropping {}", surface.share_handle());
            self.dropped += 1;
            self.queue.checkin(surface);
            return;
        };

        let (w, h) = (self.ctx.width(), self.ctx.height());
        self.rects.prepare(device, self.ctx.queue(), &self.checker, w, h);

        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("tandem_consumer_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("tandem_consumer_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(clear_color(self.background.color)),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if self.background.pattern {
                self.rects.draw(&mut pass);
            }
            self.quad.draw(&mut pass, binding);
        }
        self.ctx.queue().submit(std::iter::once(encoder.finish()));

        self.displayed += 1;
        self.last_shown = Some(surface.share_handle());
        self.queue.checkin(surface);
        self.pending = window;
    }

    fn present(&mut self, sync_interval: u32) {
        if let Some(frame) = self.pending.take() {
            frame.present();
        }
        self.ctx.set_sync_interval(sync_interval);
    }

    fn queue(&self) -> SharedSurfaceQueue {
        Arc::clone(&self.queue)
    }
}

fn create_offscreen(ctx: &GpuContext) -> TextureView {
    ctx.device()
        .create_texture(&TextureDescriptor {
            label: Some("tandem_consumer_offscreen"),
            size: Extent3d {
                width: ctx.width(),
                height: ctx.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: ctx.surface_format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        })
        .create_view(&TextureViewDescriptor::default())
}
