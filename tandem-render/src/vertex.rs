//! Plain-old-data types uploaded to GPU buffers by the rect pipeline.
//!
//! ```text
//!  slot 0, per vertex      slot 1, per instance        group 0
//!  ┌─────────────────┐     ┌─────────────────────┐     ┌────────────────┐
//!  │ @0 corner f32x2 │     │ @1 origin  f32x2    │     │ CameraUniform  │
//!  └─────────────────┘     │ @2 extent  f32x2    │     │ mat4 ortho     │
//!                          │ @3 color   f32x4    │     └────────────────┘
//!                          └─────────────────────┘
//! ```

use bytemuck::{Pod, Zeroable};
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexStepMode};

/// Corner of the unit square; the shader scales it by the instance extent.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    pub corner: [f32; 2],
}

impl QuadVertex {
    const ATTRIBUTES: [VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub const VERTICES: [QuadVertex; 4] = [
        QuadVertex { corner: [0.0, 0.0] },
        QuadVertex { corner: [1.0, 0.0] },
        QuadVertex { corner: [0.0, 1.0] },
        QuadVertex { corner: [1.0, 1.0] },
    ];

    /// Two triangles: top-left half, then bottom-right half.
    pub const INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

    pub fn layout() -> VertexBufferLayout<'static> {
        buffer_layout::<Self>(VertexStepMode::Vertex, &Self::ATTRIBUTES)
    }
}

/// One solid rectangle in target pixels.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RectInstance {
    /// Top-left corner.
    pub origin: [f32; 2],
    pub extent: [f32; 2],
    /// Straight-alpha RGBA.
    pub color: [f32; 4],
}

impl RectInstance {
    const ATTRIBUTES: [VertexAttribute; 3] =
        wgpu::vertex_attr_array![1 => Float32x2, 2 => Float32x2, 3 => Float32x4];

    pub fn new(x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) -> Self {
        Self {
            origin: [x, y],
            extent: [w, h],
            color,
        }
    }

    pub fn layout() -> VertexBufferLayout<'static> {
        buffer_layout::<Self>(VertexStepMode::Instance, &Self::ATTRIBUTES)
    }
}

fn buffer_layout<T>(
    step_mode: VertexStepMode,
    attributes: &'static [VertexAttribute],
) -> VertexBufferLayout<'static> {
    VertexBufferLayout {
        array_stride: std::mem::size_of::<T>() as BufferAddress,
        step_mode,
        attributes,
    }
}

/// Column-major projection from target pixels to clip space, y down.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn orthographic(width: f32, height: f32) -> Self {
        let mut view_proj = [[0.0; 4]; 4];
        view_proj[0][0] = 2.0 / width;
        view_proj[1][1] = -2.0 / height;
        view_proj[2][2] = 1.0;
        view_proj[3] = [-1.0, 1.0, 0.0, 1.0];
        Self { view_proj }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_clip(cam: &CameraUniform, x: f32, y: f32) -> (f32, f32) {
        let m = cam.view_proj;
        (
            x * m[0][0] + y * m[1][0] + m[3][0],
            x * m[0][1] + y * m[1][1] + m[3][1],
        )
    }

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-5 && (a.1 - b.1).abs() < 1e-5
    }

    #[test]
    fn test_pod_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 8);
        assert_eq!(std::mem::size_of::<RectInstance>(), 32);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
    }

    #[test]
    fn test_orthographic_maps_target_corners() {
        let cam = CameraUniform::orthographic(640.0, 360.0);
        assert!(close(to_clip(&cam, 0.0, 0.0), (-1.0, 1.0)));
        assert!(close(to_clip(&cam, 640.0, 360.0), (1.0, -1.0)));
        assert!(close(to_clip(&cam, 320.0, 180.0), (0.0, 0.0)));
    }

    #[test]
    fn test_layout_locations_and_step_modes() {
        let instance = RectInstance::layout();
        let offsets: Vec<_> = instance.attributes.iter().map(|a| a.offset).collect();
        let locations: Vec<_> = instance
            .attributes
            .iter()
            .map(|a| a.shader_location)
            .collect();
        assert_eq!(offsets, [0, 8, 16]);
        assert_eq!(locations, [1, 2, 3]);
        assert_eq!(instance.step_mode, VertexStepMode::Instance);
        assert_eq!(instance.array_stride, 32);

        let quad = QuadVertex::layout();
        assert_eq!(quad.step_mode, VertexStepMode::Vertex);
        assert_eq!(quad.attributes[0].shader_location, 0);
    }
}
