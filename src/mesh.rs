//! # Mesh Pass
//!
//! GPU counterpart of one scene [`Mesh`](crate::scene::Mesh): the vertex and index buffers
//! of its sphere, its per-mesh uniform, and the render pipeline that draws it. The Earth and
//! Atmosphere passes are both built on top of [`MeshPass`]; they differ only in shader, face
//! culling, depth writes, and the extra texture bind group the Earth needs.
//!
//! Bind group slots are fixed across both pipelines:
//!
//! | Group | Contents                             |
//! |-------|--------------------------------------|
//! | 0     | camera uniform                       |
//! | 1     | lighting uniform (one shared buffer) |
//! | 2     | mesh uniform (model, opacity)        |
//! | 3     | Earth textures and sampler           |

use crate::gpu::DEPTH_FORMAT;
use crate::material::Side;
use crate::uniform_binding::UniformBinding;
use crate::uniform_buffer::MeshUniform;
use crate::vertex::{SphereGeometry, Vertex};

/// Everything that varies between the Earth and Atmosphere pipelines.
///
/// # Fields
/// - `label`: debug label for the pipeline objects.
/// - `shader_source`: WGSL with `vertex_main` and `fragment_main` entry points.
/// - `side`: faces to keep; the other side is culled.
/// - `depth_write`: whether the mesh occludes what is drawn after it.
/// - `color_format`, `sample_count`: must match the render pass targets.
/// - `bind_group_layouts`: layouts for groups 0 and up, in order.
pub struct PipelineOptions<'a> {
    pub label: &'a str,
    pub shader_source: &'a str,
    pub side: Side,
    pub depth_write: bool,
    pub color_format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
}

/// Builds a triangle-list pipeline for the planet vertex layout.
pub fn create_mesh_pipeline(device: &wgpu::Device, options: &PipelineOptions) -> wgpu::RenderPipeline {
    let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(options.label),
        source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(options.shader_source)),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(options.label),
        bind_group_layouts: options.bind_group_layouts,
        push_constant_ranges: &[],
    });

    let attributes = Vertex::vertex_attributes();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(options.label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader_module,
            entry_point: Some("vertex_main"),
            buffers: &[Vertex::description(&attributes)],
            compilation_options: Default::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            // Sphere triangles wind counter-clockwise seen from outside.
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(options.side.cull_mode()),
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
            unclipped_depth: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: options.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: options.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader_module,
            entry_point: Some("fragment_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: options.color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        multiview: None,
        cache: None,
    })
}

/// Buffers, uniform and pipeline of one sphere mesh.
pub struct MeshPass {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub uniform: UniformBinding<MeshUniform>,
    pub pipeline: wgpu::RenderPipeline,
}

impl MeshPass {
    /// Uploads the sphere and creates the pipeline.
    ///
    /// `shared_layouts` holds the camera and lighting layouts (groups 0 and 1) and
    /// `extra_layouts` anything after the mesh uniform (group 3 onwards).
    pub fn new(
        device: &wgpu::Device,
        geometry: &SphereGeometry,
        shared_layouts: [&wgpu::BindGroupLayout; 2],
        extra_layouts: &[&wgpu::BindGroupLayout],
        options: PipelineOptions,
    ) -> Self {
        let mesh = geometry.build();

        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", options.label)),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", options.label)),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        let uniform = UniformBinding::<MeshUniform>::new(
            device,
            options.label,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );

        let mut layouts = vec![shared_layouts[0], shared_layouts[1], &uniform.bind_group_layout];
        layouts.extend_from_slice(extra_layouts);

        let pipeline = create_mesh_pipeline(
            device,
            &PipelineOptions {
                bind_group_layouts: &layouts,
                ..options
            },
        );

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            uniform,
            pipeline,
        }
    }

    /// Records the draw. Groups 0 and 1 must already be bound; group 3 is left to the caller.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(2, &self.uniform.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    pub fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.uniform.destroy();
    }
}
