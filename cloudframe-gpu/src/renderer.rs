//! Point and line renderer
//!
//! Points are drawn as screen-aligned squares of a fixed pixel size, one
//! instance per point. Lines use a plain line-list pipeline. Both share a
//! single camera uniform and a depth buffer.

use crate::device::GpuContext;
use bytemuck::{Pod, Zeroable};
use cloudframe_core::{Point3f, Rgb};
use nalgebra::Matrix4;
use tracing::debug;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Two triangles per point sprite
const VERTICES_PER_POINT: u32 = 6;

/// Per-instance data of one point sprite
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl PointInstance {
    pub fn new(point: &Point3f, color: Rgb) -> Self {
        Self {
            position: [point.x, point.y, point.z],
            color: color.to_array(),
        }
    }

    /// Instance buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// One end of a line segment
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    pub fn new(point: &Point3f, color: Rgb) -> Self {
        Self {
            position: [point.x, point.y, point.z],
            color: color.to_array(),
        }
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Camera uniform data
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Viewport size in physical pixels
    pub viewport: [f32; 2],
    /// Point sprite edge length in physical pixels
    pub point_size: f32,
    pub _padding: f32,
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub point_size: f32,
    pub background_color: [f64; 4],
    pub enable_depth_test: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            point_size: 3.0,
            background_color: [0.9, 0.9, 0.95, 1.0],
            enable_depth_test: true,
        }
    }
}

/// GPU buffer together with the number of elements it holds
struct GeometryBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

/// Renders the scene's points and lines into a color target
pub struct SceneRenderer {
    point_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    points: Option<GeometryBuffer>,
    lines: Option<GeometryBuffer>,
    pub config: RenderConfig,
}

impl SceneRenderer {
    /// Create the pipelines for a color target of `format` and `width` x `height` pixels
    pub fn new(
        context: &GpuContext,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: RenderConfig,
    ) -> Self {
        let camera_uniform = CameraUniform {
            view_proj: Matrix4::<f32>::identity().into(),
            viewport: [width.max(1) as f32, height.max(1) as f32],
            point_size: config.point_size,
            _padding: 0.0,
        };

        let camera_buffer = context.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::bytes_of(&camera_uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            context
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                    label: Some("camera_bind_group_layout"),
                });

        let camera_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let layout = context
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[&camera_bind_group_layout],
                push_constant_ranges: &[],
            });

        let point_shader =
            context.create_shader_module("Point Shader", include_str!("shaders/points.wgsl"));
        let line_shader =
            context.create_shader_module("Line Shader", include_str!("shaders/lines.wgsl"));

        let point_pipeline = create_pipeline(
            context,
            "Point Pipeline",
            &layout,
            &point_shader,
            PointInstance::desc(),
            wgpu::PrimitiveTopology::TriangleList,
            format,
            config.enable_depth_test,
        );
        let line_pipeline = create_pipeline(
            context,
            "Line Pipeline",
            &layout,
            &line_shader,
            LineVertex::desc(),
            wgpu::PrimitiveTopology::LineList,
            format,
            config.enable_depth_test,
        );

        let depth_view = create_depth_view(context, width, height);

        Self {
            point_pipeline,
            line_pipeline,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            depth_view,
            points: None,
            lines: None,
            config,
        }
    }

    /// Replace all point sprites
    pub fn set_points(&mut self, context: &GpuContext, points: &[PointInstance]) {
        debug!("Uploading {} point instances", points.len());
        self.points = upload(context, "Point Instance Buffer", points);
    }

    /// Replace all line segments; `vertices` holds segment end points in pairs
    pub fn set_lines(&mut self, context: &GpuContext, vertices: &[LineVertex]) {
        debug!("Uploading {} line segments", vertices.len() / 2);
        self.lines = upload(context, "Line Vertex Buffer", vertices);
    }

    pub fn point_count(&self) -> u32 {
        self.points.as_ref().map_or(0, |p| p.count)
    }

    /// Update camera view and projection matrices
    pub fn update_camera(&mut self, context: &GpuContext, view: Matrix4<f32>, projection: Matrix4<f32>) {
        self.camera_uniform.view_proj = (projection * view).into();
        self.camera_uniform.point_size = self.config.point_size;
        context
            .queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&self.camera_uniform));
    }

    /// Follow a resized color target
    pub fn resize(&mut self, context: &GpuContext, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera_uniform.viewport = [width as f32, height as f32];
        self.depth_view = create_depth_view(context, width, height);
    }

    /// Clear `target` to the background color and draw lines and points into it
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let [r, g, b, a] = self.config.background_color;
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: self.config.enable_depth_test.then(|| {
                wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        if let Some(lines) = &self.lines {
            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_vertex_buffer(0, lines.buffer.slice(..));
            render_pass.draw(0..lines.count, 0..1);
        }

        if let Some(points) = &self.points {
            render_pass.set_pipeline(&self.point_pipeline);
            render_pass.set_vertex_buffer(0, points.buffer.slice(..));
            render_pass.draw(0..VERTICES_PER_POINT, 0..points.count);
        }
    }
}

fn upload<T: Pod>(context: &GpuContext, label: &str, data: &[T]) -> Option<GeometryBuffer> {
    if data.is_empty() {
        return None;
    }
    Some(GeometryBuffer {
        buffer: context.create_buffer_init(label, data, wgpu::BufferUsages::VERTEX),
        count: data.len() as u32,
    })
}

#[allow(clippy::too_many_arguments)]
fn create_pipeline(
    context: &GpuContext,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    buffer: wgpu::VertexBufferLayout<'_>,
    topology: wgpu::PrimitiveTopology,
    format: wgpu::TextureFormat,
    depth_test: bool,
) -> wgpu::RenderPipeline {
    context
        .device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &[buffer],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: depth_test.then(|| wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        })
}

/// Create depth texture for depth testing
fn create_depth_view(context: &GpuContext, width: u32, height: u32) -> wgpu::TextureView {
    let texture = context.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_layouts_match_shader_expectations() {
        assert_eq!(std::mem::size_of::<PointInstance>(), 24);
        assert_eq!(std::mem::size_of::<LineVertex>(), 24);
        // uniform buffers need 16 byte multiples
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
    }

    #[test]
    fn test_point_instance_copies_color() {
        let p = PointInstance::new(&Point3f::new(1.0, 2.0, 3.0), Rgb::MATCH_LINE);
        assert_eq!(p.position, [1.0, 2.0, 3.0]);
        assert_eq!(p.color, [1.0, 1.0, 0.0]);
    }
}
