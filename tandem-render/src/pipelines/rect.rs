//! Instanced solid rectangles.
//!
//! One draw call per target: the unit quad is shared, each rectangle is an
//! instance (meter bars, transparency checkerboard).

use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{
    BindGroup, BindGroupLayoutEntry, BindingType, BlendState, Buffer, BufferBindingType,
    BufferUsages, ColorTargetState, ColorWrites, Device, FragmentState, IndexFormat,
    MultisampleState, PipelineCompilationOptions, PrimitiveState, Queue, RenderPass,
    RenderPipeline, ShaderStages, TextureFormat, VertexState,
};

use crate::vertex::{CameraUniform, QuadVertex, RectInstance};

/// Instances the buffer holds before its first grow.
pub const INITIAL_CAPACITY: usize = 256;

pub struct RectPipeline {
    pipeline: RenderPipeline,
    quad_vertices: Buffer,
    quad_indices: Buffer,
    camera: Buffer,
    camera_group: BindGroup,
    instances: Buffer,
    capacity: usize,
    count: u32,
}

impl RectPipeline {
    pub fn new(device: &Device, target_format: TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::include_wgsl!("../shaders/rect.wgsl"));

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("rect_camera_layout"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("rect_layout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("rect_pipeline"),
            layout: Some(&layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[QuadVertex::layout(), RectInstance::layout()],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: target_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            // Triangle list, no culling.
            primitive: PrimitiveState::default(),
            depth_stencil: None,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let quad_vertices = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("rect_quad_vertices"),
            contents: bytemuck::cast_slice(&QuadVertex::VERTICES),
            usage: BufferUsages::VERTEX,
        });
        let quad_indices = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("rect_quad_indices"),
            contents: bytemuck::cast_slice(&QuadVertex::INDICES),
            usage: BufferUsages::INDEX,
        });
        let camera = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("rect_camera"),
            contents: bytemuck::bytes_of(&CameraUniform::orthographic(1.0, 1.0)),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let camera_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("rect_camera_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            quad_vertices,
            quad_indices,
            camera,
            camera_group,
            instances: instance_buffer(device, INITIAL_CAPACITY),
            capacity: INITIAL_CAPACITY,
            count: 0,
        }
    }

    /// Stage `rects` and the projection for a `width × height` target,
    /// growing the instance buffer if needed.
    ///
    /// Writes go through `Queue::write_buffer`, so two targets of different
    /// sizes need two pipelines (or two submits) in one frame.
    pub fn prepare(
        &mut self,
        device: &Device,
        queue: &Queue,
        rects: &[RectInstance],
        width: u32,
        height: u32,
    ) {
        let camera = CameraUniform::orthographic(width as f32, height as f32);
        queue.write_buffer(&self.camera, 0, bytemuck::bytes_of(&camera));

        if rects.len() > self.capacity {
            self.capacity = rects.len().next_power_of_two();
            self.instances = instance_buffer(device, self.capacity);
            log::debug!("Rect instance buffer grown to {}", self.capacity);
        }
        if !rects.is_empty() {
            queue.write_buffer(&self.instances, 0, bytemuck::cast_slice(rects));
        }
        self.count = rects.len() as u32;
    }

    /// Record one instanced draw of everything staged by `prepare`.
    pub fn draw(&self, pass: &mut RenderPass<'_>) {
        if self.count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_group, &[]);
        pass.set_vertex_buffer(0, self.quad_vertices.slice(..));
        pass.set_vertex_buffer(1, self.instances.slice(..));
        pass.set_index_buffer(self.quad_indices.slice(..), IndexFormat::Uint16);
        pass.draw_indexed(0..QuadVertex::INDICES.len() as u32, 0, 0..self.count);
    }

    pub fn instance_count(&self) -> u32 {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn instance_buffer(device: &Device, capacity: usize) -> Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("rect_instances"),
        size: (capacity * std::mem::size_of::<RectInstance>()) as u64,
        usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
