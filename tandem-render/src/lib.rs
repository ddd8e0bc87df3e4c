//! # tandem-render
//!
//! wgpu backend for the Tandem frame exchange: a producer scene that renders
//! into a pool of shared textures and a consumer scene that imports and
//! displays them.
//!
//! ## Architecture
//!
//! ```text
//!  ProducerScene                                   ConsumerScene
//!       │ FrameBuffer::bind(h)                           │
//!       ▼                                                │
//!  RectPipeline ─► shared texture h                      │
//!       │                                                │
//!       ▼                                                ▼
//!  GpuFence ─► publish ─► SurfaceQueue ─► consume ─► ImportCache ─► QuadPipeline
//!                              ▲                                        │
//!                              └──────────────── checkin ◄──────────────┘
//!
//!  FrameBuffer ──export──► ShareRegistry ◄──open── ImportCache
//! ```
//!
//! ## Crate modules
//!
//! - [`context`] — GPU device/queue/surface initialisation
//! - [`share`] — share handle → texture registry
//! - [`frame_buffer`] — shared pool allocation, bind/unbind
//! - [`fence`] — GPU completion token
//! - [`import`] — consumer-side import cache
//! - [`vertex`] — vertex, instance, and camera data types
//! - [`pipelines`] — wgpu render pipelines (rect, quad)
//! - [`shapes`] — meter and checkerboard instance generation
//! - [`producer`] / [`consumer`] — the two `Scene` implementations

pub mod consumer;
pub mod context;
pub mod error;
pub mod fence;
pub mod frame_buffer;
pub mod import;
pub mod pipelines;
pub mod producer;
pub mod shapes;
pub mod share;
pub mod vertex;

// Re-exports for convenience
pub use consumer::ConsumerScene;
pub use context::{DeviceId, GpuContext, GpuDevice};
pub use error::{GpuError, ImportError};
pub use fence::GpuFence;
pub use frame_buffer::{BindState, FrameBuffer, Target, Viewport, SHARED_FORMAT};
pub use import::ImportCache;
pub use producer::{HandoffStats, ProducerScene};
pub use share::{ShareRegistry, SharedTextures};
pub use vertex::{CameraUniform, RectInstance};
