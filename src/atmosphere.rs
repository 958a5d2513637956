//! # Atmosphere Pass
//!
//! Draws the atmosphere shell with `shaders/atmosphere.wgsl`: the Earth sphere scaled up,
//! rasterizing only back faces and leaving the depth buffer untouched. It must be drawn after
//! the Earth so the depth test hides the part of the shell behind the planet.

use crate::mesh::{MeshPass, PipelineOptions};
use crate::scene::Mesh;
use crate::ATMOSPHERE_SHADER_SOURCE;

pub struct AtmospherePass {
    pub mesh: MeshPass,
}

impl AtmospherePass {
    pub fn new(
        device: &wgpu::Device,
        scene_mesh: &Mesh,
        shared_layouts: [&wgpu::BindGroupLayout; 2],
        color_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let mesh = MeshPass::new(
            device,
            &scene_mesh.geometry,
            shared_layouts,
            &[],
            PipelineOptions {
                label: "Atmosphere",
                shader_source: ATMOSPHERE_SHADER_SOURCE,
                side: scene_mesh.material.side(),
                depth_write: scene_mesh.material.depth_write(),
                color_format,
                sample_count,
                bind_group_layouts: &[],
            },
        );
        Self { mesh }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        self.mesh.draw(render_pass);
    }

    pub fn destroy(&self) {
        self.mesh.destroy();
    }
}
