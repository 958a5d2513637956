//! # Planet Lifecycle
//!
//! [`Planet::mount`] wires the scene, the renderer, the scroll timeline and the three page
//! listeners together, and hands back a [`Planet`] handle. [`Planet::destroy`] undoes all of
//! it.
//!
//! ## Listeners
//!
//! Mounting registers three callbacks:
//!
//! 1. **resize** on [`PageEvents::resize`]: updates the camera aspect, resizes the renderer to
//!    the new drawing buffer, refreshes the scroll trigger and re-applies the current scroll
//!    position.
//! 2. **tick** on the injected [`Scheduler`]: spins the Earth by a fixed step and renders one
//!    frame.
//! 3. **scroll** on [`PageEvents::scroll`]: scrubs the timeline, moving the camera and restyling
//!    the overlay.
//!
//! Each callback captures only `Weak` references to the shared state, so a callback that
//! fires after teardown (or after the handle was dropped) finds nothing and returns.
//!
//! ## Teardown
//!
//! [`Planet::destroy`] runs five steps in order and never stops early; whatever fails is
//! recorded in the returned [`TeardownReport`]:
//!
//! 1. remove the resize listener,
//! 2. remove the tick listener,
//! 3. kill the scroll timeline and remove its scroll listener,
//! 4. release textures, geometry and pipelines,
//! 5. release the graphics context.
//!
//! Calling it again is a no-op, and dropping the handle calls it implicitly.
//!
//! ## Example
//!
//! ```rust,ignore
//! let ticker = Rc::new(Ticker::default());
//! let page = Rc::new(PageEvents::new(viewport));
//! let mut planet = Planet::mount(
//!     Box::new(renderer),
//!     MountContext { scheduler: ticker.clone(), page: page.clone(), config },
//! );
//! // ... later, when the page goes away:
//! let report = planet.destroy();
//! ```

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use nalgebra_glm as glm;

use crate::config::{OverlayContent, PlanetConfig};
use crate::error::TeardownError;
use crate::events::{ListenerId, PageEvents};
use crate::overlay::OverlayStyle;
use crate::scene::Scene;
use crate::ticker::{Scheduler, Tick};
use crate::timeline::ScrollTimeline;
use crate::viewport::Viewport;

/// What the planet needs from whatever draws it.
///
/// The real implementation is [`Renderer`](crate::Renderer); tests substitute a recorder.
pub trait FrameRenderer {
    /// Creates GPU resources for the meshes of `scene` and starts texture loads.
    fn prepare(&mut self, scene: &Scene);

    /// Resizes the drawing buffer for `viewport`.
    fn resize(&mut self, viewport: Viewport);

    /// Draws one frame of `scene` with the overlay on top.
    fn render(&mut self, scene: &Scene, overlay: &OverlayStyle, content: &OverlayContent);

    /// Frees textures, buffers and pipelines.
    fn release_resources(&mut self) -> Result<(), TeardownError>;

    /// Frees the device and surface.
    fn release_context(&mut self) -> Result<(), TeardownError>;
}

/// Everything [`Planet::mount`] needs besides the renderer.
///
/// # Fields
/// - `scheduler`: the shared frame ticker the render loop subscribes to.
/// - `page`: resize and scroll event registries. Its current viewport and scroll offset are
///   applied immediately on mount.
/// - `config`: planet configuration.
pub struct MountContext {
    pub scheduler: Rc<dyn Scheduler>,
    pub page: Rc<PageEvents>,
    pub config: PlanetConfig,
}

/// One teardown step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    ResizeListener,
    TickListener,
    ScrollTimeline,
    Resources,
    Context,
}

/// Outcome of [`Planet::destroy`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeardownReport {
    /// Steps that ran without error.
    pub completed: Vec<TeardownStep>,
    /// Steps that reported an error. A step can appear more than once.
    pub errors: Vec<(TeardownStep, TeardownError)>,
}

impl TeardownReport {
    /// `true` when nothing went wrong.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// `true` when there was nothing to tear down.
    pub fn is_noop(&self) -> bool {
        self.completed.is_empty() && self.errors.is_empty()
    }

    fn record(&mut self, step: TeardownStep, outcome: Result<(), TeardownError>) {
        match outcome {
            Ok(()) => self.completed.push(step),
            Err(error) => {
                log::warn!("Teardown step {step:?} failed: {error}");
                self.errors.push((step, error));
            }
        }
    }
}

/// State shared between the listener callbacks.
///
/// `aspect` and `camera_position` are the camera values the resize and scroll listeners last
/// computed. They are copied into the scene whenever it can be borrowed, so a caller holding
/// [`Planet::scene`] only delays them until the next tick.
struct PlanetState {
    scene: Rc<RefCell<Scene>>,
    renderer: Box<dyn FrameRenderer>,
    timeline: ScrollTimeline,
    overlay: OverlayStyle,
    content: OverlayContent,
    rotation_step: f32,
    aspect: f32,
    camera_position: glm::Vec3,
}

impl PlanetState {
    fn resize(&mut self, viewport: Viewport, scroll_offset: f32) {
        self.aspect = viewport.aspect();
        self.renderer.resize(viewport);
        self.timeline.refresh(&viewport);
        self.scroll(scroll_offset);
        self.sync_camera();
    }

    fn scroll(&mut self, offset: f32) {
        if let Some(frame) = self.timeline.scrub(offset) {
            self.camera_position = frame.camera_position;
            self.overlay = frame.overlay;
            self.sync_camera();
        }
    }

    fn sync_camera(&self) {
        if let Ok(mut scene) = self.scene.try_borrow_mut() {
            Self::apply_camera(&mut scene, self.aspect, self.camera_position);
        }
    }

    fn apply_camera(scene: &mut Scene, aspect: f32, position: glm::Vec3) {
        scene.camera.set_aspect(aspect);
        scene.camera.position = position;
    }

    fn frame(&mut self) {
        let Ok(mut scene) = self.scene.try_borrow_mut() else {
            log::debug!("Scene borrowed elsewhere; frame skipped");
            return;
        };
        Self::apply_camera(&mut scene, self.aspect, self.camera_position);
        scene.rotate_earth(self.rotation_step);
        self.renderer.render(&scene, &self.overlay, &self.content);
    }
}

struct Mounted {
    state: Rc<RefCell<PlanetState>>,
    scheduler: Rc<dyn Scheduler>,
    page: Rc<PageEvents>,
    resize_listener: ListenerId,
    tick_listener: ListenerId,
    scroll_listener: ListenerId,
}

/// Handle to a mounted (or inert) planet.
pub struct Planet {
    scene: Rc<RefCell<Scene>>,
    mounted: Option<Mounted>,
}

impl Planet {
    /// Builds the scene, prepares the renderer and registers the resize, tick and scroll
    /// listeners.
    pub fn mount(renderer: Box<dyn FrameRenderer>, context: MountContext) -> Self {
        let MountContext {
            scheduler,
            page,
            config,
        } = context;

        let viewport = page.viewport();
        let scene = Scene::planet(&config, &viewport);
        let timeline = ScrollTimeline::new(&config.scroll, &viewport, scene.camera.position);
        log::info!(
            "Mounting planet: {} meshes, {:?} layout",
            scene.mesh_count(),
            timeline.layout()
        );

        let initial_camera = scene.camera.position;
        let scene = Rc::new(RefCell::new(scene));
        let mut renderer = renderer;
        renderer.prepare(&scene.borrow());

        let state = Rc::new(RefCell::new(PlanetState {
            scene: scene.clone(),
            renderer,
            timeline,
            overlay: OverlayStyle::default(),
            content: config.overlay.clone(),
            rotation_step: config.earth.rotation_step,
            aspect: viewport.aspect(),
            camera_position: initial_camera,
        }));

        // Size everything for the current viewport before the first frame.
        state.borrow_mut().resize(viewport, page.scroll_offset());

        let resize_listener = page.resize.add({
            let state = Rc::downgrade(&state);
            let page = Rc::downgrade(&page);
            move |viewport: &Viewport| {
                let offset = page.upgrade().map_or(0.0, |page| page.scroll_offset());
                with_state(&state, |state| state.resize(*viewport, offset));
            }
        });

        let tick_listener = scheduler.add(Box::new({
            let state = Rc::downgrade(&state);
            move |_: &Tick| with_state(&state, PlanetState::frame)
        }));

        let scroll_listener = page.scroll.add({
            let state = Rc::downgrade(&state);
            move |offset: &f32| with_state(&state, |state| state.scroll(*offset))
        });

        Self {
            scene,
            mounted: Some(Mounted {
                state,
                scheduler,
                page,
                resize_listener,
                tick_listener,
                scroll_listener,
            }),
        }
    }

    /// A handle with an empty scene and nothing to tear down, used when there is no canvas
    /// to mount on or the GPU could not be initialized.
    pub fn inert() -> Self {
        Self {
            scene: Rc::new(RefCell::new(Scene::default())),
            mounted: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// The scene graph. Frames are skipped while the returned borrow is alive.
    pub fn scene(&self) -> Ref<'_, Scene> {
        self.scene.borrow()
    }

    /// Tears everything down. See the module docs for the steps. Idempotent.
    pub fn destroy(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        let Some(mounted) = self.mounted.take() else {
            return report;
        };

        report.record(
            TeardownStep::ResizeListener,
            removed(mounted.page.resize.remove(mounted.resize_listener), "resize"),
        );

        report.record(
            TeardownStep::TickListener,
            removed(mounted.scheduler.remove(mounted.tick_listener), "tick"),
        );

        let killed = match mounted.state.try_borrow_mut() {
            Ok(mut state) => {
                state.timeline.kill();
                Ok(())
            }
            Err(_) => Err(TeardownError::StateBusy("scroll timeline")),
        };
        let unsubscribed = removed(mounted.page.scroll.remove(mounted.scroll_listener), "scroll");
        report.record(TeardownStep::ScrollTimeline, killed.and(unsubscribed));

        report.record(
            TeardownStep::Resources,
            match mounted.state.try_borrow_mut() {
                Ok(mut state) => state.renderer.release_resources(),
                Err(_) => Err(TeardownError::StateBusy("resource release")),
            },
        );

        report.record(
            TeardownStep::Context,
            match mounted.state.try_borrow_mut() {
                Ok(mut state) => state.renderer.release_context(),
                Err(_) => Err(TeardownError::StateBusy("context release")),
            },
        );

        if report.is_clean() {
            log::info!("Planet torn down");
        } else {
            log::warn!("Planet torn down with {} error(s)", report.errors.len());
        }
        report
    }
}

impl Drop for Planet {
    fn drop(&mut self) {
        if self.mounted.is_some() {
            self.destroy();
        }
    }
}

fn with_state(state: &Weak<RefCell<PlanetState>>, f: impl FnOnce(&mut PlanetState)) {
    let Some(state) = state.upgrade() else {
        return;
    };
    match state.try_borrow_mut() {
        Ok(mut state) => f(&mut state),
        Err(_) => log::debug!("Planet state busy; event skipped"),
    };
}

fn removed(was_registered: bool, listener: &'static str) -> Result<(), TeardownError> {
    if was_registered {
        Ok(())
    } else {
        Err(TeardownError::ListenerMissing(listener))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MeshKind;
    use crate::ticker::Ticker;
    use std::time::Duration;
    use web_time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Prepare { meshes: usize },
        Resize(Viewport),
        Render { rotation: f32, camera: glm::Vec3, overlay: OverlayStyle },
        ReleaseResources,
        ReleaseContext,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<Call>>>,
        fail_release: bool,
    }

    impl FrameRenderer for Recorder {
        fn prepare(&mut self, scene: &Scene) {
            self.calls.borrow_mut().push(Call::Prepare {
                meshes: scene.mesh_count(),
            });
        }

        fn resize(&mut self, viewport: Viewport) {
            self.calls.borrow_mut().push(Call::Resize(viewport));
        }

        fn render(&mut self, scene: &Scene, overlay: &OverlayStyle, _content: &OverlayContent) {
            self.calls.borrow_mut().push(Call::Render {
                rotation: scene.earth().map_or(0.0, |earth| earth.rotation.y),
                camera: scene.camera.position,
                overlay: *overlay,
            });
        }

        fn release_resources(&mut self) -> Result<(), TeardownError> {
            self.calls.borrow_mut().push(Call::ReleaseResources);
            if self.fail_release {
                return Err(TeardownError::Release {
                    what: "textures",
                    message: "device lost".to_string(),
                });
            }
            Ok(())
        }

        fn release_context(&mut self) -> Result<(), TeardownError> {
            self.calls.borrow_mut().push(Call::ReleaseContext);
            Ok(())
        }
    }

    struct Harness {
        ticker: Rc<Ticker>,
        page: Rc<PageEvents>,
        calls: Rc<RefCell<Vec<Call>>>,
        planet: Planet,
        now: Instant,
    }

    impl Harness {
        fn new(viewport: Viewport) -> Self {
            Self::with_recorder(viewport, Recorder::default())
        }

        fn with_recorder(viewport: Viewport, recorder: Recorder) -> Self {
            let ticker = Rc::new(Ticker::default());
            let page = Rc::new(PageEvents::new(viewport));
            let calls = recorder.calls.clone();
            let planet = Planet::mount(
                Box::new(recorder),
                MountContext {
                    scheduler: ticker.clone(),
                    page: page.clone(),
                    config: PlanetConfig::default(),
                },
            );
            Self {
                ticker,
                page,
                calls,
                planet,
                now: Instant::now(),
            }
        }

        fn tick(&mut self) {
            self.now += Duration::from_millis(16);
            self.ticker.tick(self.now);
        }

        fn renders(&self) -> Vec<Call> {
            self.calls
                .borrow()
                .iter()
                .filter(|call| matches!(call, Call::Render { .. }))
                .cloned()
                .collect()
        }

        fn last_render(&self) -> Call {
            self.renders().pop().unwrap()
        }
    }

    fn desktop() -> Viewport {
        Viewport::new(1280.0, 800.0, 1.0)
    }

    #[test]
    fn mount_prepares_and_sizes_before_the_first_frame() {
        let harness = Harness::new(desktop());
        assert_eq!(
            *harness.calls.borrow(),
            vec![Call::Prepare { meshes: 2 }, Call::Resize(desktop())]
        );
        assert_eq!(harness.ticker.subscriber_count(), 1);
        assert_eq!(harness.page.resize.len(), 1);
        assert_eq!(harness.page.scroll.len(), 1);
        assert_eq!(harness.planet.scene().camera.aspect, 1.6);
    }

    #[test]
    fn each_tick_rotates_by_a_fixed_step_and_renders_once() {
        let mut harness = Harness::new(desktop());
        harness.tick();
        harness.tick();

        let renders = harness.renders();
        assert_eq!(renders.len(), 2);
        let Call::Render { rotation, .. } = renders[1] else {
            unreachable!()
        };
        assert!((rotation - 0.004).abs() < 1e-6);
    }

    #[test]
    fn resize_updates_aspect_and_renderer() {
        let mut harness = Harness::new(desktop());
        let phone = Viewport::new(400.0, 800.0, 3.0);
        harness.page.emit_resize(phone);

        assert_eq!(harness.planet.scene().camera.aspect, 0.5);
        assert_eq!(harness.calls.borrow().last(), Some(&Call::Resize(phone)));
        assert_eq!(phone.drawing_buffer_size(), (800, 1600));

        harness.tick();
        assert_eq!(harness.renders().len(), 1);
    }

    #[test]
    fn scroll_moves_the_camera_and_fades_the_overlay() {
        let mut harness = Harness::new(desktop());

        harness.page.emit_scroll(400.0);
        harness.tick();
        let Call::Render { camera, overlay, .. } = harness.last_render() else {
            unreachable!()
        };
        assert!((camera.z - 24.5).abs() < 1e-4);
        assert!((overlay.opacity - 0.5).abs() < 1e-6);

        harness.page.emit_scroll(0.0);
        harness.tick();
        let Call::Render { camera, overlay, .. } = harness.last_render() else {
            unreachable!()
        };
        assert_eq!(camera, glm::vec3(0.0, 0.1, 19.0));
        assert_eq!(overlay, OverlayStyle::default());
    }

    #[test]
    fn destroy_right_after_mount_unhooks_everything() {
        let mut harness = Harness::new(desktop());
        let report = harness.planet.destroy();

        assert!(report.is_clean());
        assert_eq!(
            report.completed,
            vec![
                TeardownStep::ResizeListener,
                TeardownStep::TickListener,
                TeardownStep::ScrollTimeline,
                TeardownStep::Resources,
                TeardownStep::Context,
            ]
        );
        assert_eq!(harness.ticker.subscriber_count(), 0);
        assert!(harness.page.resize.is_empty());
        assert!(harness.page.scroll.is_empty());
        assert!(!harness.planet.is_mounted());
    }

    #[test]
    fn rotation_freezes_after_destroy() {
        let mut harness = Harness::new(desktop());
        harness.tick();
        harness.planet.destroy();
        harness.tick();
        harness.page.emit_scroll(300.0);
        harness.page.emit_resize(Viewport::new(10.0, 10.0, 1.0));

        assert_eq!(harness.renders().len(), 1);
        let rotation = harness.planet.scene().earth().unwrap().rotation.y;
        assert!((rotation - 0.002).abs() < 1e-6);
    }

    #[test]
    fn second_destroy_is_a_noop() {
        let mut harness = Harness::new(desktop());
        harness.planet.destroy();
        let calls_after_first = harness.calls.borrow().len();

        let report = harness.planet.destroy();
        assert!(report.is_noop());
        assert_eq!(harness.calls.borrow().len(), calls_after_first);
    }

    #[test]
    fn failing_step_does_not_stop_the_others() {
        let recorder = Recorder {
            fail_release: true,
            ..Recorder::default()
        };
        let mut harness = Harness::with_recorder(desktop(), recorder);
        let report = harness.planet.destroy();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, TeardownStep::Resources);
        assert!(report.completed.contains(&TeardownStep::Context));
        assert_eq!(harness.calls.borrow().last(), Some(&Call::ReleaseContext));
    }

    #[test]
    fn listener_removed_elsewhere_is_reported() {
        let mut harness = Harness::new(desktop());
        let id = harness.planet.mounted.as_ref().unwrap().tick_listener;
        assert!(harness.ticker.remove(id));

        let report = harness.planet.destroy();
        assert_eq!(
            report.errors,
            vec![(TeardownStep::TickListener, TeardownError::ListenerMissing("tick"))]
        );
        assert_eq!(report.completed.len(), 4);
    }

    #[test]
    fn dropping_the_handle_tears_down() {
        let harness = Harness::new(desktop());
        let Harness {
            ticker,
            page,
            calls,
            planet,
            ..
        } = harness;
        drop(planet);

        assert_eq!(ticker.subscriber_count(), 0);
        assert!(page.scroll.is_empty());
        assert_eq!(calls.borrow().last(), Some(&Call::ReleaseContext));
    }

    #[test]
    fn inert_planet_has_nothing_to_do() {
        let mut planet = Planet::inert();
        assert!(!planet.is_mounted());
        assert_eq!(planet.scene().mesh_count(), 0);
        assert!(planet.destroy().is_noop());
    }

    #[test]
    fn holding_the_scene_across_a_tick_skips_the_frame() {
        let mut harness = Harness::new(desktop());
        {
            let scene = harness.planet.scene();
            harness.page.emit_scroll(400.0);
            harness.ticker.tick(harness.now);
            assert_eq!(scene.camera.position, glm::vec3(0.0, 0.1, 19.0));
        }
        assert!(harness.renders().is_empty());

        harness.tick();
        let Call::Render { camera, rotation, .. } = harness.last_render() else {
            unreachable!()
        };
        assert!((camera.z - 24.5).abs() < 1e-4);
        assert!((rotation - 0.002).abs() < 1e-6);
    }

    #[test]
    fn scene_exposes_both_meshes() {
        let harness = Harness::new(Viewport::new(600.0, 800.0, 2.0));
        let scene = harness.planet.scene();
        assert!(scene.mesh(MeshKind::Earth).is_some());
        assert!(scene.mesh(MeshKind::Atmosphere).is_some());
    }
}
