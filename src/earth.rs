//! # Earth Pass
//!
//! Draws the Earth sphere with `shaders/earth.wgsl`. On top of the shared [`MeshPass`] it owns
//! the three Earth textures, their sampler, and the bind group (group 3) that exposes them to
//! the fragment shader.
//!
//! The textures start out as placeholders. Each frame the renderer calls
//! [`EarthPass::poll_textures`], which uploads any load that has finished and rebuilds the
//! bind group so the next draw samples the real image.

use crate::material::EarthMaterial;
use crate::mesh::{MeshPass, PipelineOptions};
use crate::scene::Mesh;
use crate::texture::{PendingTexture, TextureKind, TextureLoader, TextureRequest, TextureSlot};
use crate::EARTH_SHADER_SOURCE;

/// The Earth mesh and its textures on the GPU.
pub struct EarthPass {
    pub mesh: MeshPass,
    textures: [TextureSlot; 3],
    pending: Vec<PendingTexture>,
    sampler: wgpu::Sampler,
    texture_layout: wgpu::BindGroupLayout,
    texture_bind_group: wgpu::BindGroup,
    loader: TextureLoader,
}

impl EarthPass {
    /// Creates the pipeline and buffers and starts loading the textures named by `material`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene_mesh: &Mesh,
        material: &EarthMaterial,
        loader: TextureLoader,
        shared_layouts: [&wgpu::BindGroupLayout; 2],
        color_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let texture_layout = Self::create_texture_layout(device);

        let mesh = MeshPass::new(
            device,
            &scene_mesh.geometry,
            shared_layouts,
            &[&texture_layout],
            PipelineOptions {
                label: "Earth",
                shader_source: EARTH_SHADER_SOURCE,
                side: scene_mesh.material.side(),
                depth_write: scene_mesh.material.depth_write(),
                color_format,
                sample_count,
                bind_group_layouts: &[],
            },
        );

        // Start all three loads up front; each returns a placeholder to bind right away.
        let paths = [
            &material.textures.day,
            &material.textures.night,
            &material.textures.specular_clouds,
        ];
        let mut pending = Vec::with_capacity(3);
        let textures = TextureKind::ALL.map(|kind| {
            let path = paths[kind as usize].clone();
            let (slot, load) = loader.load(device, queue, TextureRequest { kind, path });
            pending.push(load);
            slot
        });

        let sampler = loader.sampler(device);
        let texture_bind_group =
            Self::create_texture_bind_group(device, &texture_layout, &textures, &sampler);

        Self {
            mesh,
            textures,
            pending,
            sampler,
            texture_layout,
            texture_bind_group,
            loader,
        }
    }

    fn create_texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("earth_texture_bind_group_layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    fn create_texture_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        textures: &[TextureSlot; 3],
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("earth_texture_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&textures[0].view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&textures[1].view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&textures[2].view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Number of textures still loading.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Uploads finished loads and swaps them in. Failed loads keep their placeholder.
    pub fn poll_textures(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let mut changed = false;
        let mut still_pending = Vec::with_capacity(self.pending.len());

        for mut load in self.pending.drain(..) {
            match load.try_take() {
                None => still_pending.push(load),
                Some(Ok(mips)) => {
                    let kind = load.request.kind;
                    let slot = self.loader.upload(device, queue, kind, &mips);
                    log::info!(
                        "Loaded {} ({}x{}, {} mips)",
                        kind.label(),
                        slot.size().width,
                        slot.size().height,
                        mips.len()
                    );
                    // The placeholder may still be referenced by an in-flight frame, so it is
                    // dropped rather than destroyed.
                    self.textures[kind as usize] = slot;
                    changed = true;
                }
                Some(Err(error)) => {
                    log::warn!("Keeping placeholder for {}: {error}", load.request.kind.label());
                }
            }
        }
        self.pending = still_pending;

        if changed {
            self.texture_bind_group = Self::create_texture_bind_group(
                device,
                &self.texture_layout,
                &self.textures,
                &self.sampler,
            );
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_bind_group(3, &self.texture_bind_group, &[]);
        self.mesh.draw(render_pass);
    }

    /// Frees textures and buffers and abandons loads still in flight.
    pub fn destroy(&mut self) {
        self.pending.clear();
        for slot in &self.textures {
            slot.destroy();
        }
        self.mesh.destroy();
    }
}
