//! Producer-side surface pool and render-target bind state.
//!
//! [`FrameBuffer`] allocates the shared textures, exports each under a
//! fresh [`ShareHandle`] and seeds a [`SurfaceQueue`] with the matching
//! [`Surface`]s. While a surface is checked out the producer brackets its
//! draw with `bind` / `unbind`:
//!
//! ```text
//!   active: Window ──bind(h)──► active: Shared(h)   saved: Window
//!                                   │ draw
//!   active: Window ◄──unbind()──────┘                saved: —
//! ```
//!
//! Binds do not nest: a second `bind` before `unbind` is rejected.

use std::sync::Arc;

use wgpu::{
    Extent3d, Texture, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
    TextureView, TextureViewDescriptor,
};

use tandem_core::{CoreError, ShareHandle, Surface, SurfaceQueue};

use crate::context::GpuContext;
use crate::error::GpuError;
use crate::share::SharedTextures;

/// Pixel format of every shared pool texture.
pub const SHARED_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

// ───────────────────────────────────────────────────────────────────
// Bind state
// ───────────────────────────────────────────────────────────────────

/// What the device is currently drawing into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// The scene's own window.
    Window,
    /// A pool surface.
    Shared(ShareHandle),
}

/// Drawable area of a target, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Active target plus at most one saved target to restore.
#[derive(Debug, Clone)]
pub struct BindState {
    active: (Target, Viewport),
    saved: Option<(Target, Viewport)>,
}

impl BindState {
    /// Start out drawing into the window.
    pub fn new(window: Viewport) -> Self {
        Self {
            active: (Target::Window, window),
            saved: None,
        }
    }

    /// Save the active target and switch to `target`.
    ///
    /// Returns `false` without changing anything if already bound.
    pub fn bind(&mut self, target: Target, viewport: Viewport) -> bool {
        if let Some((saved, _)) = self.saved {
            log::warn!(
                "bind({target:?}) while bound to {:?} (saved {saved:?}); rejected",
                self.active.0
            );
            return false;
        }
        self.saved = Some(self.active);
        self.active = (target, viewport);
        true
    }

    /// Restore the saved target and viewport.
    ///
    /// Returns `false` if nothing was bound.
    pub fn unbind(&mut self) -> bool {
        match self.saved.take() {
            Some(saved) => {
                self.active = saved;
                true
            }
            None => {
                log::warn!("unbind() without a matching bind");
                false
            }
        }
    }

    pub fn target(&self) -> Target {
        self.active.0
    }

    pub fn viewport(&self) -> Viewport {
        self.active.1
    }

    pub fn is_bound(&self) -> bool {
        self.saved.is_some()
    }
}

// ───────────────────────────────────────────────────────────────────
// Frame buffer
// ───────────────────────────────────────────────────────────────────

struct PoolTexture {
    handle: ShareHandle,
    view: TextureView,
}

/// The N shared textures of one producer.
pub struct FrameBuffer {
    textures: Vec<PoolTexture>,
    registry: SharedTextures,
    state: BindState,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    /// Allocate `count` textures of `width × height`, export them into
    /// `registry` and build the queue whose pool holds them all.
    pub fn new(
        ctx: &GpuContext,
        registry: SharedTextures,
        count: usize,
        width: u32,
        height: u32,
    ) -> Result<(Self, SurfaceQueue), GpuError> {
        if count == 0 {
            return Err(GpuError::ResourceCreation(CoreError::EmptyPool.to_string()));
        }
        let max = ctx.device().limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(GpuError::ResourceCreation(format!(
                "pool texture {width}x{height} outside 1..={max}"
            )));
        }

        let owner = ctx.gpu().id();
        let mut textures = Vec::with_capacity(count);
        let mut surfaces = Vec::with_capacity(count);
        for i in 0..count {
            let texture = Arc::new(create_pool_texture(ctx, i, width, height));
            let handle = ShareHandle::new();
            let view = texture.create_view(&TextureViewDescriptor::default());
            registry.export(handle, owner, texture);
            textures.push(PoolTexture { handle, view });
            surfaces.push(Surface::new(handle, width, height));
        }
        log::info!("Allocated {count} shared {width}x{height} surface(s)");

        let frame_buffer = Self {
            textures,
            registry,
            state: BindState::new(Viewport {
                width: ctx.width(),
                height: ctx.height(),
            }),
            width,
            height,
        };
        Ok((frame_buffer, SurfaceQueue::new(surfaces)))
    }

    /// Make the pool texture for `handle` the active render target.
    ///
    /// Returns `false` for a handle this pool does not own or if a surface
    /// is already bound.
    pub fn bind(&mut self, handle: ShareHandle) -> bool {
        if !self.textures.iter().any(|t| t.handle == handle) {
            log::warn!("bind({handle}): not a surface of this pool");
            return false;
        }
        let viewport = Viewport {
            width: self.width,
            height: self.height,
        };
        self.state.bind(Target::Shared(handle), viewport)
    }

    /// Restore the render target active before `bind`.
    pub fn unbind(&mut self) -> bool {
        self.state.unbind()
    }

    /// View of the bound pool texture, `None` while drawing to the window.
    pub fn active_view(&self) -> Option<&TextureView> {
        match self.state.target() {
            Target::Shared(handle) => self.view(handle),
            Target::Window => None,
        }
    }

    pub fn view(&self, handle: ShareHandle) -> Option<&TextureView> {
        self.textures
            .iter()
            .find(|t| t.handle == handle)
            .map(|t| &t.view)
    }

    pub fn state(&self) -> &BindState {
        &self.state
    }

    pub fn handles(&self) -> impl Iterator<Item = ShareHandle> + '_ {
        self.textures.iter().map(|t| t.handle)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        for texture in &self.textures {
            self.registry.revoke(texture.handle);
        }
    }
}

fn create_pool_texture(ctx: &GpuContext, index: usize, width: u32, height: u32) -> Texture {
    let label = format!("tandem_shared_{index}");
    ctx.device().create_texture(&TextureDescriptor {
        label: Some(&label),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: SHARED_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}

// ===================================================================
// Tests
// ===================================================================
