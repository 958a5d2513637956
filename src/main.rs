//! Desktop entry point. Set `PLANET_CONFIG` to a RON file to override the defaults and
//! `RUST_LOG` to choose the log level.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), winit::error::EventLoopError> {
    use planet_core::{App, PlanetConfig};

    env_logger::init();

    let config = match std::env::var_os("PLANET_CONFIG") {
        Some(path) => PlanetConfig::load(std::path::Path::new(&path)).unwrap_or_else(|error| {
            log::warn!("Using default configuration: {error}");
            PlanetConfig::default()
        }),
        None => PlanetConfig::default(),
    };

    let event_loop = winit::event_loop::EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)
}

#[cfg(target_arch = "wasm32")]
fn main() {}
