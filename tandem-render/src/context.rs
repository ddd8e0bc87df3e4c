//! GPU device and per-scene context.
//!
//! A [`GpuDevice`] owns `wgpu::Device` + `Queue`. Each scene owns a
//! [`GpuContext`] wrapping an `Arc<GpuDevice>` and, when rendering to a
//! window, a configured `Surface`.
//!
//! Two construction paths:
//!
//! 1. **Headless** (`GpuContext::headless`) — no window, no surface.
//!    Used for tests and benchmarks.
//!
//! 2. **Windowed** (`GpuContext::with_surface`) — takes a surface created
//!    by the caller from the same `Instance` the device came from. Used by
//!    `tandem-desktop`.
//!
//! Producer and consumer contexts must share one device for their surfaces
//! to be importable across contexts (see [`crate::share`]).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use wgpu::{
    Adapter, Device, DeviceDescriptor, Instance, InstanceDescriptor, PresentMode, Queue,
    RequestAdapterOptions, Surface, SurfaceConfiguration, SurfaceTexture, TextureFormat,
    TextureUsages,
};

use tandem_core::NO_VSYNC;

use crate::error::GpuError;

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`GpuDevice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceId(u64);

impl DeviceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A logical device plus its submission queue.
pub struct GpuDevice {
    id: DeviceId,
    pub device: Device,
    pub queue: Queue,
    pub adapter: Adapter,
}

impl GpuDevice {
    /// Request a device with no presentation target.
    pub async fn new_headless() -> Result<Arc<Self>, GpuError> {
        let instance = Instance::new(&InstanceDescriptor::default());
        Self::request(&instance, None).await
    }

    /// Request a device from `instance`, optionally able to present to
    /// `compatible_surface`.
    pub async fn request(
        instance: &Instance,
        compatible_surface: Option<&Surface<'_>>,
    ) -> Result<Arc<Self>, GpuError> {
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("tandem-device"),
                    ..Default::default()
                },
                None,
            )
            .await?;

        let gpu = Self {
            id: DeviceId::next(),
            device,
            queue,
            adapter,
        };
        log::info!("GPU device {} on {}", gpu.id, gpu.adapter_name());
        Ok(Arc::new(gpu))
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Adapter name and backend, e.g. `"NVIDIA GeForce RTX 3060 (Vulkan)"`.
    pub fn adapter_name(&self) -> String {
        let info = self.adapter.get_info();
        format!("{} ({:?})", info.name, info.backend)
    }
}

/// Present mode for a scene `sync_interval` (`0` = no vsync).
pub fn present_mode_for(sync_interval: u32) -> PresentMode {
    if sync_interval == NO_VSYNC {
        PresentMode::AutoNoVsync
    } else {
        PresentMode::AutoVsync
    }
}

/// GPU state owned by exactly one scene.
pub struct GpuContext {
    gpu: Arc<GpuDevice>,
    /// Present only when rendering to a window.
    surface: Option<Surface<'static>>,
    surface_config: Option<SurfaceConfiguration>,
    pub surface_format: TextureFormat,
    width: u32,
    height: u32,
}

impl GpuContext {
    /// A context with no window. `acquire_frame` always returns `None`.
    pub fn headless(gpu: Arc<GpuDevice>, width: u32, height: u32) -> Self {
        Self {
            gpu,
            surface: None,
            surface_config: None,
            // Headless contexts render offscreen in the window format.
            surface_format: TextureFormat::Bgra8UnormSrgb,
            width,
            height,
        }
    }

    /// A context presenting to `surface`, configured for `sync_interval`.
    ///
    /// The surface must come from the instance `gpu` was requested from.
    pub fn with_surface(
        gpu: Arc<GpuDevice>,
        surface: Surface<'static>,
        width: u32,
        height: u32,
        sync_interval: u32,
    ) -> Result<Self, GpuError> {
        let caps = surface.get_capabilities(&gpu.adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| GpuError::Surface("surface is not supported by the adapter".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: present_mode_for(sync_interval),
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&gpu.device, &config);

        Ok(Self {
            gpu,
            surface: Some(surface),
            surface_config: Some(config),
            surface_format: format,
            width,
            height,
        })
    }

    pub fn gpu(&self) -> &Arc<GpuDevice> {
        &self.gpu
    }

    pub fn device(&self) -> &Device {
        &self.gpu.device
    }

    pub fn queue(&self) -> &Queue {
        &self.gpu.queue
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_headless(&self) -> bool {
        self.surface.is_none()
    }

    /// Reconfigure the surface when `sync_interval` maps to a different
    /// present mode. No-op if headless.
    pub fn set_sync_interval(&mut self, sync_interval: u32) {
        let mode = present_mode_for(sync_interval);
        if let (Some(surface), Some(config)) = (&self.surface, &mut self.surface_config) {
            if config.present_mode != mode {
                log::debug!("Present mode {:?} -> {:?}", config.present_mode, mode);
                config.present_mode = mode;
                surface.configure(&self.gpu.device, config);
            }
        }
    }

    /// Next window image to draw into, or `None` if headless or the frame
    /// should be skipped.
    pub fn acquire_frame(&self) -> Option<SurfaceTexture> {
        let surface = self.surface.as_ref()?;
        match surface.get_current_texture() {
            Ok(frame) => Some(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(config) = &self.surface_config {
                    log::debug!("Surface lost or outdated; reconfiguring");
                    surface.configure(&self.gpu.device, config);
                }
                None
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("Surface acquire timed out; skipping frame");
                None
            }
            Err(e) => {
                log::error!("Failed to acquire surface texture: {e}");
                None
            }
        }
    }

    /// Current present mode, or `None` if headless.
    pub fn present_mode(&self) -> Option<PresentMode> {
        self.surface_config.as_ref().map(|c| c.present_mode)
    }
}

// ===================================================================
// Tests
// ===================================================================
