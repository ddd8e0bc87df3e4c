//! wgpu render pipelines.
//!
//! - [`rect`] — instanced solid rectangles
//! - [`quad`] — one texture stretched over the target

pub mod quad;
pub mod rect;

pub use quad::QuadPipeline;
pub use rect::RectPipeline;

/// Clear value for a render pass from a straight-alpha color.
pub fn clear_color(color: tandem_core::Color) -> wgpu::Color {
    wgpu::Color {
        r: f64::from(color.r),
        g: f64::from(color.g),
        b: f64::from(color.b),
        a: f64::from(color.a),
    }
}
