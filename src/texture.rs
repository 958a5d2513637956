//! # Texture Loader
//!
//! Loads the three Earth textures without ever blocking the frame loop.
//!
//! [`TextureLoader::load`] hands back two things at once:
//!
//! - a [`TextureSlot`] holding a 1×1 black placeholder, which can be bound immediately so the
//!   first frames render (as a dark sphere) while the real image is still on its way;
//! - a [`PendingTexture`] that the renderer polls once per frame. When the decoded mip chain
//!   arrives it is uploaded and swapped in for the placeholder.
//!
//! On desktop the file is read and decoded on a background thread. On the web it is fetched
//! with `window.fetch` and decoded on the browser's event loop. Both report back through a
//! `futures` oneshot channel. If the receiving side has been dropped (the planet was torn
//! down), the result is silently discarded.
//!
//! ## Color space and filtering
//!
//! Color textures (day, night) are uploaded as `Rgba8UnormSrgb` so sampling returns linear
//! values; the packed specular/cloud mask is data and uses `Rgba8Unorm`. Every texture gets a
//! full mip chain, and the shared sampler uses trilinear filtering with the highest anisotropy
//! the adapter supports. Images larger than the device's maximum 2D texture size are scaled
//! down before upload.

use futures::channel::oneshot;
use image::RgbaImage;

use crate::error::TextureLoadError;

/// How texel values are interpreted when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// sRGB-encoded color; the GPU decodes to linear on sampling.
    Srgb,
    /// Raw data, sampled as stored.
    Linear,
}

impl ColorSpace {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// The three Earth textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Day,
    Night,
    SpecularClouds,
}

impl TextureKind {
    pub const ALL: [TextureKind; 3] = [TextureKind::Day, TextureKind::Night, TextureKind::SpecularClouds];

    pub fn color_space(self) -> ColorSpace {
        match self {
            TextureKind::Day | TextureKind::Night => ColorSpace::Srgb,
            TextureKind::SpecularClouds => ColorSpace::Linear,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TextureKind::Day => "day_texture",
            TextureKind::Night => "night_texture",
            TextureKind::SpecularClouds => "specular_clouds_texture",
        }
    }
}

/// What to load and where from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRequest {
    pub kind: TextureKind,
    /// File path on desktop, URL on the web.
    pub path: String,
}

/// A GPU texture and the view the shaders sample through.
pub struct TextureSlot {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl TextureSlot {
    pub fn size(&self) -> wgpu::Extent3d {
        self.texture.size()
    }

    /// Frees the GPU memory now rather than when the last handle drops.
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

/// Outcome of one background load: the mip chain, largest level first.
pub type LoadResult = Result<Vec<RgbaImage>, TextureLoadError>;

/// A texture load that has not been picked up yet.
pub struct PendingTexture {
    pub request: TextureRequest,
    receiver: oneshot::Receiver<LoadResult>,
}

impl PendingTexture {
    /// Returns the outcome once the load has finished, `None` while it is still running.
    ///
    /// A loader that vanished without answering is reported as
    /// [`TextureLoadError::Canceled`].
    pub fn try_take(&mut self) -> Option<LoadResult> {
        match self.receiver.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(TextureLoadError::Canceled(self.request.path.clone()))),
        }
    }
}

/// Creates placeholder textures, spawns loads, and uploads finished images.
///
/// # Fields
/// - `max_anisotropy`: sampler anisotropy clamp, `1` when unsupported.
/// - `max_dimension`: largest width or height the device accepts for a 2D texture.
#[derive(Debug, Clone, Copy)]
pub struct TextureLoader {
    pub max_anisotropy: u16,
    pub max_dimension: u32,
}

impl TextureLoader {
    pub fn new(max_anisotropy: u16, max_dimension: u32) -> Self {
        Self {
            max_anisotropy: max_anisotropy.max(1),
            max_dimension: max_dimension.max(1),
        }
    }

    /// The sampler shared by all Earth textures.
    ///
    /// All three filters must be linear for the anisotropy clamp to be accepted.
    pub fn sampler(&self, device: &wgpu::Device) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("earth_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: self.max_anisotropy,
            ..Default::default()
        })
    }

    /// A 1×1 opaque black texture in the right format for `kind`.
    pub fn placeholder(&self, device: &wgpu::Device, queue: &wgpu::Queue, kind: TextureKind) -> TextureSlot {
        let black = RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
        upload(device, queue, kind, std::slice::from_ref(&black))
    }

    /// Starts loading `request` and returns a placeholder to bind in the meantime.
    pub fn load(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        request: TextureRequest,
    ) -> (TextureSlot, PendingTexture) {
        let placeholder = self.placeholder(device, queue, request.kind);
        let (sender, receiver) = oneshot::channel();

        log::debug!("Loading {} from {}", request.kind.label(), request.path);
        spawn_load(request.path.clone(), self.max_dimension, sender);

        (placeholder, PendingTexture { request, receiver })
    }

    /// Uploads a finished mip chain.
    pub fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        kind: TextureKind,
        mips: &[RgbaImage],
    ) -> TextureSlot {
        upload(device, queue, kind, mips)
    }
}

fn upload(device: &wgpu::Device, queue: &wgpu::Queue, kind: TextureKind, mips: &[RgbaImage]) -> TextureSlot {
    let (width, height) = mips.first().map(|base| base.dimensions()).unwrap_or((1, 1));

    // Mip levels are stored back to back, largest first, which is the layout
    // `create_texture_with_data` expects for a single-layer texture.
    let data: Vec<u8> = mips.iter().flat_map(|mip| mip.as_raw().iter().copied()).collect();

    let texture = wgpu::util::DeviceExt::create_texture_with_data(
        device,
        queue,
        &wgpu::TextureDescriptor {
            label: Some(kind.label()),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mips.len().max(1) as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: kind.color_space().format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &data,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    TextureSlot { texture, view }
}

/// Decodes an encoded image (JPEG or PNG) into RGBA8.
pub fn decode_image(bytes: &[u8], path: &str) -> Result<RgbaImage, TextureLoadError> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgba8())
        .map_err(|source| TextureLoadError::Decode {
            path: path.to_string(),
            source,
        })
}

/// Scales `image` to fit within `max_dimension` and builds its full mip chain down to 1×1.
pub fn mip_chain(image: RgbaImage, max_dimension: u32) -> Vec<RgbaImage> {
    use image::imageops::{resize, FilterType};

    let (width, height) = image.dimensions();
    let largest = width.max(height);
    let base = if largest > max_dimension {
        let scale = max_dimension as f64 / largest as f64;
        let fit = |side: u32| ((side as f64 * scale).floor() as u32).clamp(1, max_dimension);
        resize(&image, fit(width), fit(height), FilterType::Triangle)
    } else {
        image
    };

    let mut mips = vec![base];
    while let Some(last) = mips.last() {
        let (width, height) = last.dimensions();
        if width == 1 && height == 1 {
            break;
        }
        let next = resize(last, (width / 2).max(1), (height / 2).max(1), FilterType::Triangle);
        mips.push(next);
    }
    mips
}

#[cfg(not(target_arch = "wasm32"))]
fn read_mips(path: &str, max_dimension: u32) -> LoadResult {
    let bytes = std::fs::read(path).map_err(|source| TextureLoadError::Io {
        path: path.to_string(),
        source,
    })?;
    let image = decode_image(&bytes, path)?;
    Ok(mip_chain(image, max_dimension))
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_load(path: String, max_dimension: u32, sender: oneshot::Sender<LoadResult>) {
    let spawned = std::thread::Builder::new()
        .name("texture-loader".to_string())
        .spawn(move || {
            // The receiver is gone when the planet was torn down mid-load.
            let _ = sender.send(read_mips(&path, max_dimension));
        });

    if let Err(error) = spawned {
        log::warn!("Failed to spawn texture loader thread: {error}");
    }
}

#[cfg(target_arch = "wasm32")]
fn spawn_load(path: String, max_dimension: u32, sender: oneshot::Sender<LoadResult>) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = match fetch_bytes(&path).await {
            Ok(bytes) => decode_image(&bytes, &path).map(|image| mip_chain(image, max_dimension)),
            Err(error) => Err(error),
        };
        let _ = sender.send(result);
    });
}

#[cfg(target_arch = "wasm32")]
async fn fetch_bytes(url: &str) -> Result<Vec<u8>, TextureLoadError> {
    use wasm_bindgen::JsCast as _;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    let fail = |message: String| TextureLoadError::Fetch {
        url: url.to_string(),
        message,
    };

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|e| fail(format!("failed to create request: {e:?}")))?;

    let window = web_sys::window().ok_or_else(|| fail("no window".to_string()))?;
    let response = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| fail(format!("{e:?}")))?;

    let response: Response = response
        .dyn_into()
        .map_err(|_| fail("response is not a Response".to_string()))?;

    if !response.ok() {
        return Err(fail(format!("HTTP {}", response.status())));
    }

    let buffer = wasm_bindgen_futures::JsFuture::from(
        response
            .array_buffer()
            .map_err(|e| fail(format!("failed to read body: {e:?}")))?,
    )
    .await
    .map_err(|e| fail(format!("failed to read body: {e:?}")))?;

    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn color_textures_are_srgb_and_masks_are_linear() {
        assert_eq!(TextureKind::Day.color_space().format(), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(TextureKind::Night.color_space().format(), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(
            TextureKind::SpecularClouds.color_space().format(),
            wgpu::TextureFormat::Rgba8Unorm
        );
    }

    #[test]
    fn png_bytes_decode_to_rgba() {
        let source = RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
        let decoded = decode_image(&encode_png(&source), "test.png").unwrap();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(3, 1), &image::Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let err = decode_image(b"definitely not a jpeg", "broken.jpg").unwrap_err();
        assert!(matches!(err, TextureLoadError::Decode { .. }));
    }

    #[test]
    fn mip_chain_runs_down_to_one_texel() {
        let mips = mip_chain(RgbaImage::new(8, 4), 4096);
        let sizes: Vec<(u32, u32)> = mips.iter().map(|mip| mip.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn oversized_images_are_scaled_to_fit() {
        let mips = mip_chain(RgbaImage::new(64, 16), 32);
        assert_eq!(mips[0].dimensions(), (32, 8));
        assert_eq!(mips.len(), 6);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_mips("/nonexistent/earth/day.jpg", 4096).unwrap_err();
        assert!(matches!(err, TextureLoadError::Io { .. }));
    }

    #[test]
    fn files_on_disk_load_into_mips() {
        let path = std::env::temp_dir().join(format!("planet-texture-{}.png", std::process::id()));
        std::fs::write(&path, encode_png(&RgbaImage::new(2, 2))).unwrap();

        let mips = read_mips(path.to_str().unwrap(), 4096).unwrap();
        assert_eq!(mips.len(), 2);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn pending_texture_reports_result_then_cancellation() {
        let request = TextureRequest {
            kind: TextureKind::Day,
            path: "earth/day.jpg".to_string(),
        };

        let (sender, receiver) = oneshot::channel();
        let mut pending = PendingTexture {
            request: request.clone(),
            receiver,
        };
        assert!(pending.try_take().is_none());
        sender.send(Ok(vec![RgbaImage::new(1, 1)])).unwrap();
        assert_eq!(pending.try_take().unwrap().unwrap().len(), 1);

        let (sender, receiver) = oneshot::channel::<LoadResult>();
        let mut canceled = PendingTexture { request, receiver };
        drop(sender);
        assert!(matches!(
            canceled.try_take(),
            Some(Err(TextureLoadError::Canceled(_)))
        ));
    }
}
