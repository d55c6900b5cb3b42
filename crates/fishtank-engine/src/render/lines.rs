use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::coords::ColorRgba;
use crate::render::{RenderCtx, RenderTarget};

/// One end of a line segment, in world space.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4  // color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// CPU-side list of colored segments, drawn as a `LineList`.
#[derive(Debug, Default, Clone)]
pub struct LineBatch {
    vertices: Vec<LineVertex>,
}

impl LineBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    pub fn line(&mut self, a: Vec3, b: Vec3, color: ColorRgba) {
        let color = color.to_array();
        self.vertices.push(LineVertex { position: a.to_array(), color });
        self.vertices.push(LineVertex { position: b.to_array(), color });
    }

    /// Segments between consecutive points; `closed` joins the last to the first.
    pub fn polyline(&mut self, points: &[Vec3], closed: bool, color: ColorRgba) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], color);
        }
        if let (true, [first, .., last]) = (closed, points) {
            self.line(*last, *first, color);
        }
    }

    /// Parallelogram spanned by `u` and `v` from `corner`.
    pub fn quad_outline(&mut self, corner: Vec3, u: Vec3, v: Vec3, color: ColorRgba) {
        self.polyline(&[corner, corner + u, corner + u + v, corner + v], true, color);
    }

    /// `cells_u` by `cells_v` grid over the parallelogram spanned by `u` and `v`.
    pub fn grid(&mut self, corner: Vec3, u: Vec3, v: Vec3, cells_u: u32, cells_v: u32, color: ColorRgba) {
        let cells_u = cells_u.max(1);
        let cells_v = cells_v.max(1);
        for i in 0..=cells_u {
            let a = corner + u * (i as f32 / cells_u as f32);
            self.line(a, a + v, color);
        }
        for j in 0..=cells_v {
            let a = corner + v * (j as f32 / cells_v as f32);
            self.line(a, a + u, color);
        }
    }

    /// The twelve edges of an axis-aligned box.
    pub fn box_edges(&mut self, min: Vec3, max: Vec3, color: ColorRgba) {
        let size = max - min;
        let (dx, dy, dz) = (Vec3::X * size.x, Vec3::Y * size.y, Vec3::Z * size.z);
        self.quad_outline(min, dx, dy, color);
        self.quad_outline(min + dz, dx, dy, color);
        for corner in [min, min + dx, min + dy, min + dx + dy] {
            self.line(corner, corner + dz, color);
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// Draws a [`LineBatch`] with one view-projection matrix.
///
/// Depth testing follows the reversed-Z convention (`Greater`) when the
/// target has a depth attachment.
#[derive(Default)]
pub struct LineRenderer {
    pipeline_key: Option<(wgpu::TextureFormat, Option<wgpu::TextureFormat>)>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    camera_ubo: Option<wgpu::Buffer>,

    vertex_vbo: Option<wgpu::Buffer>,
    vertex_capacity: usize,
}

impl LineRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        batch: &LineBatch,
        view_proj: Mat4,
    ) {
        if batch.is_empty() {
            return;
        }

        // A pipeline built for a depth format cannot run without the attachment.
        let depth_format = target.depth_view.and(ctx.depth_format);

        self.ensure_pipeline(ctx, depth_format);
        self.ensure_bindings(ctx);
        self.ensure_vertex_capacity(ctx, batch.vertices.len());

        let Some(camera_ubo) = self.camera_ubo.as_ref() else { return };
        let Some(vbo) = self.vertex_vbo.as_ref() else { return };
        ctx.queue.write_buffer(
            camera_ubo,
            0,
            bytemuck::bytes_of(&CameraUniform { view_proj: view_proj.to_cols_array_2d() }),
        );
        ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&batch.vertices));

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };

        let depth_stencil_attachment = match (target.depth_view, depth_format) {
            (Some(view), Some(_)) => Some(wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            _ => None,
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("fishtank line pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.draw(0..batch.vertices.len() as u32, 0..1);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, depth_format: Option<wgpu::TextureFormat>) {
        let key = (ctx.surface_format, depth_format);
        if self.pipeline_key == Some(key) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fishtank line shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/lines.wgsl").into()),
        });

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fishtank line bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<CameraUniform>() as u64),
                },
                count: None,
            }],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fishtank line pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("fishtank line pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[LineVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Greater,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        self.pipeline_key = Some(key);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        self.bind_group = None;
        self.camera_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.camera_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let camera_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fishtank line camera ubo"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fishtank line bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_ubo.as_entire_binding(),
            }],
        });

        self.camera_ubo = Some(camera_ubo);
        self.bind_group = Some(bind_group);
    }

    fn ensure_vertex_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.vertex_capacity && self.vertex_vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(256);
        self.vertex_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fishtank line vbo"),
            size: (new_cap * std::mem::size_of::<LineVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vertex_capacity = new_cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_polyline_wraps_around() {
        let mut batch = LineBatch::new();
        batch.polyline(&[Vec3::ZERO, Vec3::X, Vec3::Y], true, ColorRgba::WHITE);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.vertices()[5].position, [0.0, 0.0, 0.0]);

        batch.clear();
        batch.polyline(&[Vec3::ZERO, Vec3::X, Vec3::Y], false, ColorRgba::WHITE);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn single_point_polyline_draws_nothing() {
        let mut batch = LineBatch::new();
        batch.polyline(&[Vec3::ONE], true, ColorRgba::WHITE);
        assert!(batch.is_empty());
    }

    #[test]
    fn grid_has_both_families() {
        let mut batch = LineBatch::new();
        batch.grid(Vec3::ZERO, Vec3::X * 10.0, Vec3::Y * 10.0, 4, 2, ColorRgba::WHITE);
        assert_eq!(batch.len(), 5 + 3);
    }

    #[test]
    fn box_has_twelve_edges() {
        let mut batch = LineBatch::new();
        batch.box_edges(Vec3::ZERO, Vec3::ONE, ColorRgba::BLACK);
        assert_eq!(batch.len(), 12);
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<LineVertex>(), 28);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
    }
}
