//! The contract implemented by producer and consumer scenes.

use crate::surface::SharedSurfaceQueue;

/// Present without waiting for vertical blank.
pub const NO_VSYNC: u32 = 0;
/// Present synchronised to vertical blank.
pub const VSYNC: u32 = 1;

/// A scene driven externally by tick → render → present.
///
/// Each scene privately owns its device/context; only the surfaces moved
/// through [`Scene::queue`] are shared with the other role.
pub trait Scene: Send {
    /// Descriptive adapter name, for diagnostics.
    fn gpu(&self) -> String;

    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Accepts `"transparent"` or `#AARRGGBB`; anything else clears to zero.
    fn set_background(&mut self, spec: &str);

    /// Advance animation state to `seconds` since the clock started.
    /// Called at most once per frame.
    fn tick(&mut self, seconds: f64);

    /// One GPU draw cycle, including the surface handoff for this role.
    fn render(&mut self);

    /// Submit the frame to the scene's own display. `0` = no vsync, `1` = vsync.
    fn present(&mut self, sync_interval: u32);

    /// The queue a consumer is wired to at construction time.
    fn queue(&self) -> SharedSurfaceQueue;
}
