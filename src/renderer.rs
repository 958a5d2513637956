//! # Renderer
//!
//! The `wgpu` implementation of [`FrameRenderer`]. It owns the [`Gpu`], the size-dependent
//! render targets, the uniform bindings shared by both planet pipelines, the Earth and
//! Atmosphere passes, and the `egui` state that paints the hero overlay.
//!
//! ## Frame Structure
//!
//! Every frame is a single render pass:
//!
//! 1. Finished texture loads are uploaded and swapped in for their placeholders.
//! 2. The camera, lighting and per-mesh uniforms are written from the scene graph.
//! 3. The pass clears color to transparent black and depth to `1.0`.
//! 4. The meshes are drawn in scene order: Earth first (writing depth), then the atmosphere
//!    shell (testing against it).
//! 5. The overlay is tessellated by `egui` and drawn on top.
//!
//! With multisampling the pass renders into an MSAA texture and resolves into the surface
//! texture; otherwise it renders into the surface texture directly.
//!
//! ## Surface Errors
//!
//! A lost or outdated surface is reconfigured and the frame is skipped. Timeouts skip the
//! frame silently. Anything else is logged and the frame is skipped; the next tick tries
//! again.
//!
//! ## Teardown
//!
//! [`FrameRenderer::release_resources`] destroys the textures, buffers and pipelines.
//! [`FrameRenderer::release_context`] destroys the device and drops the surface. After
//! either call, frames are no-ops.

// `Arc` shares the window with the app. The surface borrows it for `'static`, so the renderer
// holds its own reference.
use std::sync::Arc;

// `Window` feeds egui its input and scale factor. `Theme` picks the overlay's visuals.
use winit::window::{Theme, Window};

// The two mesh passes. The Earth pass owns the texture bind group and swaps in textures as
// they finish loading. The atmosphere pass draws the back faces of the outer shell.
use crate::atmosphere::AtmospherePass;
use crate::config::OverlayContent;
use crate::earth::EarthPass;
use crate::error::{GpuError, TeardownError};
// `Gpu` holds the device, queue and surface. Its depth format is shared by the mesh
// pipelines and the egui renderer so both can draw in one pass.
use crate::gpu::{Gpu, DEPTH_FORMAT};
use crate::material::Material;
use crate::overlay::{self, OverlayStyle};
// The renderer is the planet's only view of the GPU. `Planet` drives it through this trait,
// which is what lets the lifecycle run against a recording fake in tests.
use crate::planet::FrameRenderer;
use crate::scene::{MeshKind, Scene};
use crate::texture::TextureLoader;
use crate::uniform_binding::UniformBinding;
use crate::uniform_buffer::{CameraUniform, LightingUniform, MeshUniform};
use crate::viewport::Viewport;

/// GPU objects released by [`FrameRenderer::release_resources`].
///
/// # Fields
/// - `depth_texture_view`, `msaa_texture_view`: render targets sized to the drawing buffer.
///   The MSAA view is `None` when the sample count is `1`.
/// - `egui_renderer`: draws the hero overlay inside the mesh pass.
/// - `camera`, `lighting`: uniform bindings shared by both mesh passes (groups 0 and 1).
/// - `earth`, `atmosphere`: the mesh passes. `None` until the scene's meshes are prepared.
struct Resources {
    depth_texture_view: wgpu::TextureView,
    msaa_texture_view: Option<wgpu::TextureView>,
    egui_renderer: egui_wgpu::Renderer,
    camera: UniformBinding<CameraUniform>,
    lighting: UniformBinding<LightingUniform>,
    earth: Option<EarthPass>,
    atmosphere: Option<AtmospherePass>,
}

impl Resources {
    fn destroy(&mut self) {
        if let Some(earth) = self.earth.as_mut() {
            earth.destroy();
        }
        if let Some(atmosphere) = self.atmosphere.as_ref() {
            atmosphere.destroy();
        }
        self.camera.destroy();
        self.lighting.destroy();
    }
}

/// Renders the planet scene and its overlay into a window or canvas.
///
/// # Fields
/// - `window`: the window or canvas the surface presents to.
/// - `gpu`: the GPU context. Taken by [`FrameRenderer::release_context`], after which
///   frames are skipped.
/// - `resources`: targets, bindings and passes. Taken by
///   [`FrameRenderer::release_resources`].
/// - `gui_state`: egui's winit integration, which collects input and applies platform output.
/// - `viewport`: the CSS size and capped pixel ratio the targets were last sized for.
pub struct Renderer {
    window: Arc<Window>,
    gpu: Option<Gpu>,
    resources: Option<Resources>,
    gui_state: egui_winit::State,
    viewport: Viewport,
}

impl Renderer {
    /// Brings up the GPU for `window` and creates the shared render state.
    ///
    /// # Parameters
    /// - `window`: the window (or canvas-backed window on the web) to draw into.
    /// - `width`, `height`: initial drawing buffer size in physical pixels.
    ///
    /// # Errors
    /// Propagates any [`GpuError`] from [`Gpu::new_async`].
    pub async fn new(window: Arc<Window>, width: u32, height: u32) -> Result<Self, GpuError> {
        let gpu = Gpu::new_async(window.clone(), width, height).await?;

        let depth_texture_view = gpu.create_depth_texture(width, height);
        let msaa_texture_view = gpu.create_msaa_texture(width, height);

        // The overlay is drawn inside the same pass as the meshes, so the egui pipeline has
        // to match its color format, depth format and sample count.
        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_format,
            Some(DEPTH_FORMAT),
            gpu.sample_count,
            false,
        );

        let camera = UniformBinding::<CameraUniform>::new(
            &gpu.device,
            "camera",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );
        let lighting = UniformBinding::<LightingUniform>::new(
            &gpu.device,
            "lighting",
            wgpu::ShaderStages::FRAGMENT,
        );

        let gui_context = egui::Context::default();
        let viewport_id = gui_context.viewport_id();
        let gui_state = egui_winit::State::new(
            gui_context,
            viewport_id,
            &window,
            Some(window.scale_factor() as f32),
            Some(Theme::Dark),
            Some(gpu.max_texture_dimension as usize),
        );

        let scale_factor = window.scale_factor();
        Ok(Self {
            window,
            viewport: Viewport::from_physical(width, height, scale_factor),
            gui_state,
            resources: Some(Resources {
                depth_texture_view,
                msaa_texture_view,
                egui_renderer,
                camera,
                lighting,
                earth: None,
                atmosphere: None,
            }),
            gpu: Some(gpu),
        })
    }

    /// Builds the `egui` input for this frame, pinned to the capped pixel ratio so the
    /// overlay lines up with the drawing buffer.
    fn overlay_input(&mut self) -> egui::RawInput {
        let mut raw_input = self.gui_state.take_egui_input(&self.window);
        let pixels_per_point = self.viewport.effective_pixel_ratio();

        raw_input.screen_rect = Some(egui::Rect::from_min_size(
            egui::Pos2::ZERO,
            egui::vec2(self.viewport.width, self.viewport.height),
        ));
        if let Some(info) = raw_input.viewports.get_mut(&raw_input.viewport_id) {
            info.native_pixels_per_point = Some(pixels_per_point);
        }
        raw_input
    }
}

impl FrameRenderer for Renderer {
    fn prepare(&mut self, scene: &Scene) {
        let (Some(gpu), Some(resources)) = (self.gpu.as_ref(), self.resources.as_mut()) else {
            return;
        };

        let loader = TextureLoader::new(gpu.max_anisotropy, gpu.max_texture_dimension);
        let shared_layouts = [
            &resources.camera.bind_group_layout,
            &resources.lighting.bind_group_layout,
        ];

        for mesh in scene.meshes() {
            match &mesh.material {
                Material::Earth(material) => {
                    resources.earth = Some(EarthPass::new(
                        &gpu.device,
                        &gpu.queue,
                        mesh,
                        material,
                        loader,
                        shared_layouts,
                        gpu.surface_format,
                        gpu.sample_count,
                    ));
                }
                Material::Atmosphere(_) => {
                    resources.atmosphere = Some(AtmospherePass::new(
                        &gpu.device,
                        mesh,
                        shared_layouts,
                        gpu.surface_format,
                        gpu.sample_count,
                    ));
                }
            }
        }
        log::debug!("Prepared {} mesh passes", scene.mesh_count());
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let (width, height) = viewport.drawing_buffer_size();

        let (Some(gpu), Some(resources)) = (self.gpu.as_mut(), self.resources.as_mut()) else {
            return;
        };
        log::info!("Resizing drawing buffer to ({width}, {height})");
        gpu.resize(width, height);
        resources.depth_texture_view = gpu.create_depth_texture(width, height);
        resources.msaa_texture_view = gpu.create_msaa_texture(width, height);
    }

    fn render(&mut self, scene: &Scene, style: &OverlayStyle, content: &OverlayContent) {
        if self.gpu.is_none() || self.resources.is_none() {
            return;
        }

        // Run the overlay UI first; it only needs the egui state.
        let raw_input = self.overlay_input();
        let full_output = self
            .gui_state
            .egui_ctx()
            .run(raw_input, |ctx| overlay::show(ctx, style, content));
        self.gui_state
            .handle_platform_output(&self.window, full_output.platform_output);
        let paint_jobs = self
            .gui_state
            .egui_ctx()
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let (Some(gpu), Some(resources)) = (self.gpu.as_mut(), self.resources.as_mut()) else {
            return;
        };

        if let Some(earth) = resources.earth.as_mut() {
            earth.poll_textures(&gpu.device, &gpu.queue);
        }

        resources
            .camera
            .update(&gpu.queue, &CameraUniform::from(&scene.camera));
        if let Some(lighting) = scene.lighting() {
            resources.lighting.update(&gpu.queue, &lighting.uniform());
        }
        for mesh in scene.meshes() {
            let uniform = MeshUniform::new(mesh.model_matrix(), mesh.material.opacity());
            let binding = match mesh.kind {
                MeshKind::Earth => resources.earth.as_ref().map(|pass| &pass.mesh.uniform),
                MeshKind::Atmosphere => resources.atmosphere.as_ref().map(|pass| &pass.mesh.uniform),
            };
            if let Some(binding) = binding {
                binding.update(&gpu.queue, &uniform);
            }
        }

        for (id, image_delta) in &full_output.textures_delta.set {
            resources
                .egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }

        let surface_texture = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated; reconfiguring");
                gpu.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => return,
            Err(error) => {
                log::error!("Failed to acquire surface texture: {error}");
                return;
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor {
                format: Some(gpu.surface_format),
                ..Default::default()
            });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.surface_config.width, gpu.surface_config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Planet Encoder"),
            });

        resources.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        // Draw into the MSAA target and resolve into the surface when multisampling.
        let (color_view, resolve_target) = match resources.msaa_texture_view.as_ref() {
            Some(msaa_view) => (msaa_view, Some(&surface_texture_view)),
            None => (&surface_texture_view, None),
        };

        encoder.insert_debug_marker("Render planet");

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Planet Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &resources.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &resources.camera.bind_group, &[]);
            render_pass.set_bind_group(1, &resources.lighting.bind_group, &[]);

            for mesh in scene.meshes() {
                match mesh.kind {
                    MeshKind::Earth => {
                        if let Some(earth) = resources.earth.as_ref() {
                            earth.draw(&mut render_pass);
                        }
                    }
                    MeshKind::Atmosphere => {
                        if let Some(atmosphere) = resources.atmosphere.as_ref() {
                            atmosphere.draw(&mut render_pass);
                        }
                    }
                }
            }

            resources.egui_renderer.render(
                &mut render_pass.forget_lifetime(),
                &paint_jobs,
                &screen_descriptor,
            );
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();

        for id in &full_output.textures_delta.free {
            resources.egui_renderer.free_texture(id);
        }
    }

    fn release_resources(&mut self) -> Result<(), TeardownError> {
        if let Some(mut resources) = self.resources.take() {
            resources.destroy();
            log::debug!("Released planet GPU resources");
        }
        Ok(())
    }

    fn release_context(&mut self) -> Result<(), TeardownError> {
        if let Some(gpu) = self.gpu.take() {
            gpu.device.destroy();
            log::debug!("Released graphics context");
        }
        Ok(())
    }
}
