//! # Application Shell (`app.rs`)
//!
//! The `winit` side of the planet. [`App`] owns the window, the shared [`Ticker`], the page
//! event hub and the [`Planet`] handle, and turns window events into the page-level signals
//! the planet listens to.
//!
//! ## Event Mapping
//!
//! | Window event                  | Page signal                                          |
//! |-------------------------------|------------------------------------------------------|
//! | `Resized`                     | [`PageEvents::emit_resize`] with the new [`Viewport`] |
//! | `MouseWheel` (desktop)        | `PageScroll::scroll_by`, then [`PageEvents::emit_scroll`] |
//! | page `scroll` (web)           | [`PageEvents::emit_scroll`] with the offset past the hero section |
//! | `RedrawRequested`             | [`Ticker::tick`]                                     |
//! | `CloseRequested` / `Escape`   | [`Planet::destroy`], then exit                      |
//!
//! A desktop window has no page to scroll, so the wheel drives a simulated scroll offset
//! that spans the pinned section: `pin_viewports` viewport heights. On the web the real page
//! scrolls and `HeroScroll` measures it against the hero section.
//!
//! ## Platform-Specific Notes
//!
//! - **Desktop**:
//!   - Creates a titled window and initializes the `Renderer` synchronously with `pollster`.
//!
//! - **WebAssembly**:
//!   - Attaches to the canvas matching [`PlanetConfig::canvas_selector`]. Without one the
//!     planet stays inert and nothing is drawn.
//!   - Leaves wheel and touch events to the page so it scrolls normally over the canvas.
//!   - Binds the section matching [`PlanetConfig::hero_selector`] once the planet is mounted,
//!     pins it while the timeline plays, and re-measures it on every resize.
//!   - Initializes the `Renderer` asynchronously and receives it through a
//!     `oneshot::Receiver`, polled on every event until it arrives.
//!
//! ## Example Usage
//!
//! ```ignore
//! use winit::event_loop::EventLoop;
//! use planet_core::{App, PlanetConfig};
//!
//! let event_loop = EventLoop::new()?;
//! let mut app = App::new(PlanetConfig::default());
//! event_loop.run_app(&mut app)?;
//! ```

// `wasm_bindgen::prelude::*` brings `JsCast` into scope on the web, which the canvas lookup
// needs to turn the queried `Element` into an `HtmlCanvasElement`.
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// `Rc` shares the ticker and the page event hub with the mounted planet. Everything here runs
// on the event loop thread, so no atomic counting is needed.
use std::rc::Rc;

// `Arc` holds the `Window`. The renderer keeps its own clone for the surface, which has to
// outlive every frame drawn into it.
use std::sync::Arc;

// `Instant` from `web_time` reads the browser's high-resolution clock on WebAssembly and the
// standard monotonic clock elsewhere. Each redraw stamps the ticker with it.
use web_time::Instant;

// Types from `winit` for window creation and event handling:
// - `ApplicationHandler`: the trait `App` implements to receive loop callbacks.
// - `WindowEvent`: the window events mapped to page signals.
// - `ActiveEventLoop`: creates the window and exits the loop.
// - `KeyCode`, `PhysicalKey`: match the Escape key.
// - `Window`, `WindowId`: the window the planet is drawn into.
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::PlanetConfig;
#[cfg(target_arch = "wasm32")]
use crate::error::GpuError;
use crate::events::PageEvents;
// Desktop windows have no document, so the wheel drives a simulated page offset instead.
#[cfg(not(target_arch = "wasm32"))]
use crate::events::PageScroll;
// On the web the real page scroll past the hero section drives the timeline.
#[cfg(target_arch = "wasm32")]
use crate::hero_scroll::HeroScroll;
use crate::planet::{MountContext, Planet};
// The `Renderer` owns the GPU context, both mesh passes and the overlay. The planet only sees
// it through `FrameRenderer`.
use crate::renderer::Renderer;
use crate::ticker::{LagSmoothing, Ticker};
use crate::viewport::Viewport;

/// Window, page signals and the mounted planet.
///
/// # Fields
/// - `config`: settings handed to the planet on mount. The canvas and hero selectors, the
///   scroll range and the ticker's lag smoothing are all read from here.
/// - `window`: the window, created on the first `resumed`. On the web it wraps the page canvas
///   instead of opening a new surface.
/// - `ticker`: the shared frame ticker. Advanced once per `RedrawRequested`, it drives the
///   Earth's rotation and the frame render through the planet's subscription.
/// - `page`: resize and scroll signals the planet subscribes to. The app is the only emitter.
/// - `scroll` (desktop only): the simulated page scroll offset, clamped to the pinned range and
///   moved by the mouse wheel.
/// - `hero_scroll` (wasm only): the window `scroll` listener bound to the hero section. Present
///   once the planet is mounted and the section exists, and dropped on teardown.
/// - `planet`: the planet handle. `None` until a renderer is ready, then either mounted or inert.
/// - `renderer_receiver` (wasm only): delivers the asynchronously created renderer. Polled on
///   every window event until it resolves.
pub struct App {
    config: PlanetConfig,
    window: Option<Arc<Window>>,
    ticker: Rc<Ticker>,
    page: Rc<PageEvents>,
    #[cfg(not(target_arch = "wasm32"))]
    scroll: PageScroll,
    #[cfg(target_arch = "wasm32")]
    hero_scroll: Option<HeroScroll>,
    planet: Option<Planet>,
    #[cfg(target_arch = "wasm32")]
    renderer_receiver: Option<futures::channel::oneshot::Receiver<Result<Renderer, GpuError>>>,
}

impl App {
    pub fn new(config: PlanetConfig) -> Self {
        let ticker = Ticker::new(LagSmoothing::from(&config.ticker));
        Self {
            config,
            window: None,
            ticker: Rc::new(ticker),
            page: Rc::new(PageEvents::new(Viewport::default())),
            #[cfg(not(target_arch = "wasm32"))]
            scroll: PageScroll::default(),
            #[cfg(target_arch = "wasm32")]
            hero_scroll: None,
            planet: None,
            #[cfg(target_arch = "wasm32")]
            renderer_receiver: None,
        }
    }

    /// The planet handle, once mounting has been attempted.
    pub fn planet(&self) -> Option<&Planet> {
        self.planet.as_ref()
    }

    fn viewport_of(window: &Window) -> Viewport {
        let size = window.inner_size();
        Viewport::from_physical(size.width, size.height, window.scale_factor())
    }

    /// Updates the scroll range for `viewport` and broadcasts the resize.
    fn track_viewport(&mut self, viewport: Viewport) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let before = self.scroll.offset();
            self.scroll
                .set_max(self.config.scroll.pin_viewports * viewport.height);
            self.page.emit_resize(viewport);
            if self.scroll.offset() != before {
                self.page.emit_scroll(self.scroll.offset());
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            self.page.emit_resize(viewport);
            if let Some(hero_scroll) = self.hero_scroll.as_ref() {
                hero_scroll.refresh(viewport);
            }
        }
    }

    fn mount(&mut self, renderer: Renderer) {
        let viewport = self
            .window
            .as_deref()
            .map(Self::viewport_of)
            .unwrap_or_default();
        self.track_viewport(viewport);
        let planet = Planet::mount(
            Box::new(renderer),
            MountContext {
                scheduler: self.ticker.clone(),
                page: self.page.clone(),
                config: self.config.clone(),
            },
        );
        self.planet = Some(planet);

        #[cfg(target_arch = "wasm32")]
        {
            self.hero_scroll = HeroScroll::attach(
                &self.config.hero_selector,
                &self.config.scroll,
                viewport,
                &self.page,
            );
            if self.hero_scroll.is_none() {
                log::warn!(
                    "No section matches `{}`; the planet will not follow the page scroll",
                    self.config.hero_selector
                );
            }
        }
    }

    fn teardown(&mut self) {
        #[cfg(target_arch = "wasm32")]
        {
            self.hero_scroll = None;
        }
        let Some(planet) = self.planet.as_mut() else {
            return;
        };
        let report = planet.destroy();
        for (step, error) in &report.errors {
            log::error!("Teardown step {step:?} failed: {error}");
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn poll_renderer(&mut self) {
        let Some(receiver) = self.renderer_receiver.as_mut() else {
            return;
        };
        match receiver.try_recv() {
            Ok(Some(Ok(renderer))) => {
                self.renderer_receiver = None;
                self.mount(renderer);
            }
            Ok(Some(Err(error))) => {
                self.renderer_receiver = None;
                log::error!("Failed to initialize the GPU: {error}");
                self.planet = Some(Planet::inert());
            }
            Ok(None) => {}
            Err(_) => {
                self.renderer_receiver = None;
                log::error!("Renderer initialization was canceled");
                self.planet = Some(Planet::inert());
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.planet.is_some() {
            return;
        }

        let mut attributes = Window::default_attributes();

        #[cfg(not(target_arch = "wasm32"))]
        {
            attributes = attributes.with_title("Planet").with_transparent(true);
        }

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;
            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| {
                    document
                        .query_selector(&self.config.canvas_selector)
                        .ok()
                        .flatten()
                })
                .and_then(|element| element.dyn_into::<web_sys::HtmlCanvasElement>().ok());
            let Some(canvas) = canvas else {
                log::warn!(
                    "No canvas matches `{}`; the planet will not be drawn",
                    self.config.canvas_selector
                );
                self.planet = Some(Planet::inert());
                return;
            };
            // The page keeps its own wheel and touch scrolling.
            attributes = attributes
                .with_canvas(Some(canvas))
                .with_prevent_default(false);
        }

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(error) => {
                log::error!("Failed to create window: {error}");
                self.planet = Some(Planet::inert());
                return;
            }
        };
        self.window = Some(window.clone());

        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        log::info!("Surface dimensions: ({width} x {height})");

        #[cfg(not(target_arch = "wasm32"))]
        {
            match pollster::block_on(Renderer::new(window.clone(), width, height)) {
                Ok(renderer) => self.mount(renderer),
                Err(error) => {
                    log::error!("Failed to initialize the GPU: {error}");
                    self.planet = Some(Planet::inert());
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let (sender, receiver) = futures::channel::oneshot::channel();
            self.renderer_receiver = Some(receiver);
            wasm_bindgen_futures::spawn_local(async move {
                let renderer = Renderer::new(window.clone(), width, height).await;
                if sender.send(renderer).is_err() {
                    log::error!("Failed to send renderer!");
                }
            });
        }

        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        #[cfg(target_arch = "wasm32")]
        self.poll_renderer();

        let Some(window) = self.window.clone() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting...");
                self.teardown();
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(size) => {
                let viewport = Viewport::from_physical(size.width, size.height, window.scale_factor());
                log::debug!("Resizing to {} x {} CSS px", viewport.width, viewport.height);
                self.track_viewport(viewport);
            }
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => -y * PageScroll::LINE_HEIGHT,
                    winit::event::MouseScrollDelta::PixelDelta(position) => {
                        -(position.y / window.scale_factor()) as f32
                    }
                };
                if self.scroll.scroll_by(delta) {
                    self.page.emit_scroll(self.scroll.offset());
                }
            }
            WindowEvent::RedrawRequested => {
                self.ticker.tick(Instant::now());
            }
            _ => (),
        }

        window.request_redraw();
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}
