//! # Planet Renderer Library
//!
//! A scroll-reactive 3D Earth rendered with `wgpu`: a textured planet with day and night sides,
//! city lights, clouds and specular oceans, wrapped in a Fresnel atmosphere shell. The camera
//! glides away from the planet and a hero text overlay fades out as the page scrolls through
//! a pinned section. The same crate runs as a desktop window and inside a web page canvas.
//!
//! ## Modules
//!
//! - [`app`]: `winit` application shell that turns window events into page signals.
//! - [`planet`]: mounts the planet, wires its listeners, and tears it all down again.
//! - [`renderer`]: the `wgpu` frame renderer behind [`FrameRenderer`].
//! - [`gpu`]: device, queue and surface setup.
//! - [`scene`]: the scene graph of camera, group and meshes.
//! - [`camera`]: perspective camera.
//! - [`lighting`]: sun direction and atmosphere colors shared by both materials.
//! - [`material`]: Earth and Atmosphere material parameters.
//! - [`mesh`], [`earth`], [`atmosphere`]: GPU passes for the two meshes.
//! - [`shading`]: CPU reference of the shader math.
//! - [`texture`]: asynchronous texture loading with placeholders.
//! - [`ticker`]: the shared frame clock.
//! - [`timeline`]: scroll-driven camera and overlay animation.
//! - [`overlay`]: the hero text drawn with `egui`.
//! - [`events`]: revocable resize and scroll listeners.
//! - `hero_scroll` (web only): forwards the page scroll past the hero section and pins it.
//! - [`viewport`]: viewport size and pixel-ratio cap.
//! - [`vertex`]: vertex layout and UV sphere generation.
//! - [`uniform_buffer`], [`uniform_binding`]: uniform structs and their GPU bindings.
//! - [`config`]: RON configuration with defaults for every setting.
//! - [`error`]: error types.
//!
//! ## Constants
//!
//! ### [`EARTH_SHADER_SOURCE`]
//!
//! WGSL for the Earth. Blends the day and night textures across the terminator, brightens
//! clouds, tints the rim with the atmosphere colors and adds a specular glint on the oceans.
//!
//! ### [`ATMOSPHERE_SHADER_SOURCE`]
//!
//! WGSL for the atmosphere shell. Only the rim facing the sun is visible; its color shifts
//! from twilight to day color with the sun angle.
//!
//! ## Usage
//!
//! 1. **Configure**: start from [`PlanetConfig::default`] or load a RON file with
//!    [`PlanetConfig::load`].
//! 2. **Run**: hand an [`App`] to a `winit` event loop. It creates the window, the
//!    [`Renderer`] and mounts the [`Planet`].
//! 3. **Tear down**: closing the window calls [`Planet::destroy`], which reports what it
//!    released in a [`TeardownReport`].
//!
//! ## Example
//!
//! ```ignore
//! use planet_core::{App, PlanetConfig};
//! use winit::event_loop::EventLoop;
//!
//! let event_loop = EventLoop::new()?;
//! let mut app = App::new(PlanetConfig::default());
//! event_loop.run_app(&mut app)?;
//! ```
//!
//! ## Dependencies
//!
//! - `wgpu`: rendering pipelines and GPU resource management.
//! - `winit`: window and event management.
//! - `egui`, `egui-wgpu`, `egui-winit`: the text overlay.
//! - `nalgebra-glm`: matrix and vector math.
//! - `image`: texture decoding.
//! - `serde`, `ron`: configuration.
//! - `thiserror`: error types.
//! - `log`, with `env_logger` on desktop and `console_log` on the web.

pub mod app;
pub mod atmosphere;
pub mod camera;
pub mod config;
pub mod earth;
pub mod error;
pub mod events;
pub mod gpu;
#[cfg(target_arch = "wasm32")]
pub mod hero_scroll;
pub mod lighting;
pub mod material;
pub mod mesh;
pub mod overlay;
pub mod planet;
pub mod renderer;
pub mod scene;
pub mod shading;
pub mod texture;
pub mod ticker;
pub mod timeline;
pub mod uniform_binding;
pub mod uniform_buffer;
pub mod vertex;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub use crate::app::App;
pub use crate::camera::PerspectiveCamera;
pub use crate::config::{OverlayContent, PlanetConfig};
pub use crate::error::{ConfigError, GpuError, TeardownError, TextureLoadError};
pub use crate::events::{ListenerId, PageEvents, PageScroll};
pub use crate::gpu::Gpu;
pub use crate::lighting::{Lighting, SharedLighting};
pub use crate::overlay::OverlayStyle;
pub use crate::planet::{FrameRenderer, MountContext, Planet, TeardownReport, TeardownStep};
pub use crate::renderer::Renderer;
pub use crate::scene::{Mesh, MeshKind, Scene};
pub use crate::ticker::{LagSmoothing, Scheduler, Tick, Ticker};
pub use crate::timeline::ScrollTimeline;
pub use crate::uniform_binding::UniformBinding;
pub use crate::vertex::{SphereGeometry, Vertex};
pub use crate::viewport::Viewport;

/// WGSL for the Earth mesh.
///
/// ### Bindings
///
/// - group 0: camera (`view_projection`, `position`)
/// - group 1: lighting (`sun_direction`, day and twilight atmosphere colors)
/// - group 2: mesh (`model`, `params.x` opacity)
/// - group 3: day, night and specular/clouds textures plus one sampler
///
/// ### Fragment Stage
///
/// The sun orientation picks between the night and day textures, clouds are mixed in from
/// the green channel of the specular/clouds texture, the rim picks up the atmosphere color
/// through a Fresnel term, and the red channel masks a specular highlight.
pub const EARTH_SHADER_SOURCE: &str = include_str!("shaders/earth.wgsl");

/// WGSL for the atmosphere shell.
///
/// Uses the same groups 0 to 2 as [`EARTH_SHADER_SOURCE`]. The output alpha is the rim
/// falloff times the sun orientation times the mesh opacity.
pub const ATMOSPHERE_SHADER_SOURCE: &str = include_str!("shaders/atmosphere.wgsl");

/// Web entry point: installs the panic hook and console logger, then starts the event loop.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    use winit::platform::web::EventLoopExtWebSys;

    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if let Err(error) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&error.to_string().into());
    }

    let event_loop = winit::event_loop::EventLoop::new()
        .map_err(|error| JsValue::from_str(&error.to_string()))?;
    event_loop.spawn_app(App::new(PlanetConfig::default()));
    Ok(())
}
