//! Producer scene — draws the animated meter into a shared surface and
//! hands it to the consumer.
//!
//! One `render()` is one handoff:
//!
//! ```text
//!  checkout ─► bind(h) ─► draw ─► unbind ─► draw window ─► submit
//!                                                            │
//!                  produce / checkin ◄── publish ◄── fence ◄─┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use wgpu::{
    BindGroup, BlendState, CommandEncoder, CommandEncoderDescriptor, Extent3d, LoadOp,
    Operations, RenderPassColorAttachment, RenderPassDescriptor, StoreOp, SurfaceTexture,
    TexelCopyBufferLayout, TexelCopyTextureInfo, TextureDescriptor, TextureDimension,
    TextureFormat, TextureUsages, TextureView, TextureViewDescriptor,
};

use tandem_core::{
    publish, AssetProvider, Background, FencePolicy, FpsCounter, Handoff, Image,
    PipelineConfig, Scene, SharedSurfaceQueue,
};

use crate::context::GpuContext;
use crate::error::GpuError;
use crate::fence::GpuFence;
use crate::frame_buffer::{FrameBuffer, SHARED_FORMAT};
use crate::pipelines::{clear_color, QuadPipeline, RectPipeline};
use crate::shapes;
use crate::share::SharedTextures;
use crate::vertex::RectInstance;

/// Running totals of handoff outcomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandoffStats {
    /// Frames the consumer will see with confirmed GPU completion.
    pub published: u64,
    /// Frames produced after a fence timeout.
    pub unconfirmed: u64,
    /// Frames returned to the pool after a fence timeout.
    pub dropped: u64,
    /// Cycles with no free surface.
    pub skipped: u64,
}

impl HandoffStats {
    fn record(&mut self, outcome: Handoff) {
        match outcome {
            Handoff::Published => self.published += 1,
            Handoff::PublishedUnconfirmed => self.unconfirmed += 1,
            Handoff::Dropped => self.dropped += 1,
        }
    }
}

/// Background image bound once per target format.
struct BackgroundImage {
    shared: BindGroup,
    window: BindGroup,
}

/// Pipelines for one target format.
struct Layer {
    rects: RectPipeline,
    image: QuadPipeline,
}

impl Layer {
    fn new(ctx: &GpuContext, format: TextureFormat) -> Self {
        Self {
            rects: RectPipeline::new(ctx.device(), format),
            image: QuadPipeline::new(
                ctx.device(),
                format,
                BlendState::PREMULTIPLIED_ALPHA_BLENDING,
            ),
        }
    }
}

pub struct ProducerScene {
    ctx: GpuContext,
    frames: FrameBuffer,
    queue: SharedSurfaceQueue,
    gpu_name: String,

    // Pipelines
    shared: Layer,
    window: Layer,
    image: Option<BackgroundImage>,

    // Frame state
    background: Background,
    instances: Vec<RectInstance>,
    pending: Option<SurfaceTexture>,
    fps: FpsCounter,

    // Handoff
    checkout_timeout: Duration,
    fence_timeout: Duration,
    fence_policy: FencePolicy,
    stats: HandoffStats,
}

impl ProducerScene {
    /// Allocate the shared pool on `ctx`'s device and export it into
    /// `registry`.
    pub fn new(
        ctx: GpuContext,
        registry: SharedTextures,
        config: &PipelineConfig,
    ) -> Result<Self, GpuError> {
        let (frames, queue) = FrameBuffer::new(
            &ctx,
            registry,
            config.pool_size,
            config.width,
            config.height,
        )?;
        let shared = Layer::new(&ctx, SHARED_FORMAT);
        let window = Layer::new(&ctx, ctx.surface_format);
        let gpu_name = ctx.gpu().adapter_name();
        log::info!("Producer scene {}x{} on {gpu_name}", ctx.width(), ctx.height());

        Ok(Self {
            ctx,
            frames,
            queue: Arc::new(queue),
            gpu_name,
            shared,
            window,
            image: None,
            background: Background::parse(&config.producer_background),
            instances: Vec::new(),
            pending: None,
            fps: FpsCounter::new(),
            checkout_timeout: config.checkout_timeout,
            fence_timeout: config.fence_timeout,
            fence_policy: config.fence_policy,
            stats: HandoffStats::default(),
        })
    }

    /// Draw the named asset under the meter. Returns `false` if it cannot
    /// be located or loaded.
    pub fn set_background_image(&mut self, assets: &dyn AssetProvider, name: &str) -> bool {
        let Some(path) = assets.locate(name) else {
            log::warn!("Background image {name:?} not found");
            return false;
        };
        let Some(image) = assets.load_image(&path) else {
            log::warn!("Failed to load background image {}", path.display());
            return false;
        };
        let view = match upload_image(&self.ctx, &image) {
            Ok(view) => view,
            Err(e) => {
                log::warn!("Background image {} rejected: {e}", path.display());
                return false;
            }
        };
        let device = self.ctx.device();
        self.image = Some(BackgroundImage {
            shared: self.shared.image.bind(device, &view),
            window: self.window.image.bind(device, &view),
        });
        log::info!("Producer background image {}", path.display());
        true
    }

    pub fn clear_background_image(&mut self) {
        self.image = None;
    }

    pub fn handoff_stats(&self) -> HandoffStats {
        self.stats
    }

    pub fn fps(&self) -> &FpsCounter {
        &self.fps
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frames
    }

    pub fn background(&self) -> Background {
        self.background
    }
}

impl Scene for ProducerScene {
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
    }

    fn tick(&mut self, seconds: f64) {
        self.instances = shapes::meter(seconds, self.ctx.width(), self.ctx.height());
        self.fps.frame(seconds);
    }

    fn render(&mut self) {
        let Some(surface) = self.queue.checkout(self.checkout_timeout) else {
            self.stats.skipped += 1;
            return;
        };
        if !self.frames.bind(surface.share_handle()) {
            self.queue.checkin(surface);
            return;
        }

        let (device, queue) = (self.ctx.device(), self.ctx.queue());
        self.shared.rects.prepare(
            device,
            queue,
            &self.instances,
            surface.width(),
            surface.height(),
        );

        let window = self.ctx.acquire_frame();
        if window.is_some() {
            let (w, h) = (self.ctx.width(), self.ctx.height());
            self.window
                .rects
                .prepare(device, queue, &self.instances, w, h);
        }

        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("tandem_producer_encoder"),
        });

        if let Some(view) = self.frames.active_view() {
            draw_layer(
                &mut encoder,
                view,
                self.background,
                &self.shared,
                self.image.as_ref().map(|i| &i.shared),
            );
        }
        self.frames.unbind();

        if let Some(frame) = &window {
            let view = frame.texture.create_view(&TextureViewDescriptor::default());
            draw_layer(
                &mut encoder,
                &view,
                self.background,
                &self.window,
                self.image.as_ref().map(|i| &i.window),
            );
        }

        queue.submit(std::iter::once(encoder.finish()));
        let fence = GpuFence::submit(self.ctx.gpu());
        let outcome = publish(
            &self.queue,
            surface,
            &fence,
            self.fence_timeout,
            self.fence_policy,
        );
        self.stats.record(outcome);
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

fn draw_layer(
    encoder: &mut CommandEncoder,
    view: &TextureView,
    background: Background,
    layer: &Layer,
    image: Option<&BindGroup>,
) {
    let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
        label: Some("tandem_producer_pass"),
        color_attachments: &[Some(RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: Operations {
                load: LoadOp::Clear(clear_color(background.color)),
                store: StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    if let Some(image) = image {
        layer.image.draw(&mut pass, image);
    }
    layer.rects.draw(&mut pass);
}

/// Upload a premultiplied BGRA image into a sampled texture.
///
/// Images the device cannot hold are rejected before any wgpu call.
fn upload_image(ctx: &GpuContext, image: &Image) -> Result<TextureView, GpuError> {
    let (width, height) = (image.width, image.height);
    let max = ctx.device().limits().max_texture_dimension_2d;
    if width == 0 || height == 0 || width > max || height > max {
        return Err(GpuError::ResourceCreation(format!(
            "image {width}x{height} outside 1..={max}"
        )));
    }
    let row = width
        .checked_mul(4)
        .filter(|&row| row <= image.stride)
        .ok_or_else(|| {
            GpuError::ResourceCreation(format!(
                "stride {} too short for width {width}",
                image.stride
            ))
        })?;
    let needed = (image.stride as usize)
        .checked_mul(height as usize - 1)
        .and_then(|n| n.checked_add(row as usize));
    if !matches!(needed, Some(n) if image.data.len() >= n) {
        return Err(GpuError::ResourceCreation(format!(
            "{} bytes too few for {width}x{height} at stride {}",
            image.data.len(),
            image.stride
        )));
    }

    let size = Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = ctx.device().create_texture(&TextureDescriptor {
        label: Some("tandem_background_image"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Bgra8Unorm,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    ctx.queue().write_texture(
        TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.data,
        TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.stride),
            rows_per_image: Some(image.height),
        },
        size,
    );
    Ok(texture.create_view(&TextureViewDescriptor::default()))
}
