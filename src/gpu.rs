//! # GPU Management Module
//!
//! The `gpu` module owns the `wgpu` objects that live for as long as the planet is mounted:
//! the surface tied to the window or canvas, the device and its queue, and the surface
//! configuration. It also records the adapter capabilities the rest of the renderer adapts to.
//!
//! ## Overview
//!
//! [`Gpu::new_async`] walks the usual `wgpu` bring-up sequence (instance, surface, adapter,
//! device) and reports every failure as a [`GpuError`] instead of panicking, so a page
//! without WebGPU or WebGL2 support simply ends up without a planet.
//!
//! ## Capabilities
//!
//! Three adapter properties are queried once and kept on the struct:
//!
//! - **Multisampling**: 4× MSAA when both the surface format and the depth format support it,
//!   otherwise a single sample.
//! - **Anisotropic filtering**: a sampler clamp of 16 when the adapter advertises
//!   `DownlevelFlags::ANISOTROPIC_FILTERING`, otherwise 1.
//! - **Texture size**: the largest 2D texture the device accepts, used to scale oversized
//!   images before upload.
//!
//! ## Transparency
//!
//! The planet floats over the page, so the surface is cleared to transparent black and, when
//! the platform allows it, composited with premultiplied alpha.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let gpu = Gpu::new_async(window.clone(), width, height).await?;
//! let depth = gpu.create_depth_texture(width, height);
//! let msaa = gpu.create_msaa_texture(width, height);
//! ```

// `GpuError` is what every setup step here returns instead of panicking. It separates a
// missing adapter from a failed surface or device request, so callers can log which one
// left the planet inert.
use crate::error::GpuError;

/// Depth buffer format shared by the 3D pipelines and the overlay.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Preferred multisample count.
const MSAA_SAMPLES: u32 = 4;

/// Anisotropy clamp used when the adapter supports anisotropic filtering.
const MAX_ANISOTROPY: u16 = 16;

/// The GPU resources and capabilities the renderer draws with.
///
/// # Fields
/// - `surface`: the presentation surface of the window or canvas. Reconfigured on every
///   resize and after the surface is lost or outdated.
/// - `device`: creates buffers, textures and pipelines. Destroyed in the second teardown
///   stage, after every resource created from it.
/// - `queue`: receives uniform buffer writes, texture uploads and command submissions.
/// - `surface_config`: the current surface size and presentation settings. The alpha mode is
///   premultiplied when the surface supports it, so the page shows through the clear color.
/// - `surface_format`: the (non-sRGB) color format of the surface. The shaders write their
///   output without re-encoding, and the egui pipeline is built for the same format.
/// - `sample_count`: MSAA sample count of the color and depth targets. `4` when the adapter
///   supports it for the surface format, `1` otherwise.
/// - `max_anisotropy`: anisotropy clamp for texture samplers. `1` disables anisotropic
///   filtering on adapters without it.
/// - `max_texture_dimension`: largest accepted width or height of a 2D texture. Larger
///   decoded images are downscaled before upload.
pub struct Gpu {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub surface_format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub max_anisotropy: u16,
    pub max_texture_dimension: u32,
}

impl Gpu {
    /// Reconfigures the surface for a new drawing buffer size.
    ///
    /// A zero-sized surface is invalid in `wgpu`, so each side is clamped to at least one
    /// pixel. Callers recreate their size-dependent textures afterwards.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Re-applies the current configuration, used after the surface reports it was lost.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Creates a depth buffer matching the surface size and the MSAA sample count.
    pub fn create_depth_texture(&self, width: u32, height: u32) -> wgpu::TextureView {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: self.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Creates the multisampled color target, or `None` when rendering single-sampled.
    ///
    /// The 3D passes and the overlay draw into this texture and resolve into the surface
    /// texture at the end of the pass.
    pub fn create_msaa_texture(&self, width: u32, height: u32) -> Option<wgpu::TextureView> {
        if self.sample_count <= 1 {
            return None;
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("MSAA Color Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: self.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: self.surface_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
    }

    /// Asynchronously brings up the GPU for `window`.
    ///
    /// # Parameters
    /// - `window`: anything `wgpu` can build a `'static` surface from, typically an
    ///   `Arc<winit::window::Window>`.
    /// - `width`, `height`: initial drawing buffer size in physical pixels.
    ///
    /// # Errors
    /// Returns a [`GpuError`] when the surface cannot be created, no adapter is compatible
    /// with it, or the adapter refuses to create a device.
    pub async fn new_async(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Planet Device"),
                    memory_hints: wgpu::MemoryHints::default(),
                    required_features: wgpu::Features::default(),
                    #[cfg(not(target_arch = "wasm32"))]
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    #[cfg(all(target_arch = "wasm32", not(feature = "webgl")))]
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    #[cfg(all(target_arch = "wasm32", feature = "webgl"))]
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);

        // egui renders into a non-sRGB target and the planet shaders write their colors
        // without an output conversion, so a linear surface format is preferred.
        let surface_format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8Unorm);

        let alpha_mode = if surface_capabilities
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        let present_mode = surface_capabilities
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        let supports_msaa = |format: wgpu::TextureFormat| {
            adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(MSAA_SAMPLES)
        };
        let sample_count = if supports_msaa(surface_format) && supports_msaa(DEPTH_FORMAT) {
            MSAA_SAMPLES
        } else {
            1
        };

        let max_anisotropy = if adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::ANISOTROPIC_FILTERING)
        {
            MAX_ANISOTROPY
        } else {
            1
        };

        let max_texture_dimension = device.limits().max_texture_dimension_2d;

        log::info!(
            "Surface {surface_format:?} ({alpha_mode:?}), {sample_count}x MSAA, \
             anisotropy {max_anisotropy}, max texture {max_texture_dimension}"
        );

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            surface_format,
            sample_count,
            max_anisotropy,
            max_texture_dimension,
        })
    }
}
