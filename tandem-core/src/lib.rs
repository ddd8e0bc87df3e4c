//! # tandem-core
//!
//! Graphics-API-independent half of the Tandem frame exchange: the bounded
//! surface pool shared by a producer and a consumer scene, the pausable
//! clock that animates both, and the render loop that drives them.
//!
//! ## Architecture
//!
//! ```text
//!  RenderLoop ──tick/render/present──► producer Scene ──produce──┐
//!      │                                   ▲                      ▼
//!      │                               checkout              SurfaceQueue
//!      │                                   │                      │
//!      └──────tick/render/present──► consumer Scene ◄──consume───┘
//!                                          │
//!                                       checkin ──► pool
//! ```
//!
//! ## Crate modules
//!
//! - [`clock`] — pausable monotonic time source
//! - [`queue`] — `BlockingQueue<T>`, FIFO with bounded `pop`
//! - [`surface`] — `Surface`, `ShareHandle`, `SurfaceQueue`
//! - [`fence`] — `CompletionToken` and `wait_for_completion`
//! - [`handoff`] — fenced produce with an explicit timeout policy
//! - [`scene`] — the `Scene` contract
//! - [`render_loop`] — combined / split render threads, cancellation
//! - [`color`] — background parsing
//! - [`stats`] — FPS accounting
//! - [`overlay`] — line-based diagnostic console
//! - [`assets`] — asset provider contract
//! - [`config`] — `PipelineConfig`

pub mod assets;
pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod fence;
pub mod handoff;
pub mod overlay;
pub mod queue;
pub mod render_loop;
pub mod scene;
pub mod stats;
pub mod surface;

// Re-exports for convenience
pub use assets::{AssetProvider, Image, MemoryAssets};
pub use clock::Clock;
pub use color::{Background, Color};
pub use config::PipelineConfig;
pub use error::CoreError;
pub use fence::{wait_for_completion, CompletionToken, SignalToken, FENCE_TIMEOUT};
pub use handoff::{publish, FencePolicy, Handoff};
pub use overlay::{Console, Overlay};
pub use queue::BlockingQueue;
pub use render_loop::{BoxedScene, CancellationToken, LoopMode, RenderContext, RenderLoop};
pub use scene::{Scene, NO_VSYNC, VSYNC};
pub use stats::FpsCounter;
pub use surface::{ShareHandle, SharedSurfaceQueue, Surface, SurfaceQueue, DEFAULT_WAIT};
