//! # Scroll Timeline
//!
//! Ties the camera position and the hero overlay style to how far the page has been scrolled
//! through the pinned hero section.
//!
//! ## Model
//!
//! A [`ScrollTrigger`] turns a scroll offset into a progress value in `0..=1`. The hero
//! section is pinned from the moment its top reaches the top of the viewport (offset `0`)
//! until the page has scrolled `pin_viewports` viewport heights further. The timeline is
//! *scrubbed*: every track is evaluated directly from the current progress, so scrolling back
//! up plays the animation in reverse and returning to offset `0` restores the exact starting
//! values.
//!
//! Four tracks run linearly and in lockstep over the whole range:
//!
//! | Track           | From                     | To                         |
//! |-----------------|--------------------------|----------------------------|
//! | camera position | the camera's initial one | wide or narrow target      |
//! | overlay opacity | 1                        | `overlay_opacity` (0)      |
//! | overlay blur    | 0 px                     | `overlay_blur` (12 px)     |
//! | overlay scale   | 1                        | `overlay_scale` (0.85)     |
//!
//! The camera target depends on the layout: viewports narrower than the breakpoint pull the
//! camera further back so the planet still fits. The layout is chosen once, when the timeline
//! is built.

use nalgebra_glm as glm;

use crate::config::ScrollConfig;
use crate::overlay::OverlayStyle;
use crate::viewport::Viewport;

/// Linear interpolation.
pub trait Lerp: Copy {
    fn lerp(from: Self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        from + (to - from) * t
    }
}

impl Lerp for glm::Vec3 {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        glm::lerp(&from, &to, t)
    }
}

/// A linear tween between two values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween<T> {
    pub from: T,
    pub to: T,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T) -> Self {
        Self { from, to }
    }

    /// Value at `progress`, clamped to `0..=1`. Progress `0` returns `from` exactly.
    pub fn at(&self, progress: f32) -> T {
        let t = progress.clamp(0.0, 1.0);
        if t <= 0.0 {
            self.from
        } else if t >= 1.0 {
            self.to
        } else {
            T::lerp(self.from, self.to, t)
        }
    }
}

/// Maps scroll offsets to progress over the pinned range.
///
/// Offsets are measured from the top of the hero section: `0` is the moment the section's top
/// reaches the top of the viewport.
///
/// # Fields
/// - `start`, `end`: the scrubbed range, in CSS pixels of page scroll.
/// - `pin`: whether the section is held on screen while the range plays. A pinned section
///   needs [`ScrollTrigger::pin_spacing`] extra page height below it, and is shifted down by
///   [`ScrollTrigger::pin_translation`] to cancel out the scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTrigger {
    pub start: f32,
    pub end: f32,
    pub pin: bool,
    pin_viewports: f32,
}

impl ScrollTrigger {
    pub fn new(pin_viewports: f32, viewport: &Viewport) -> Self {
        let mut trigger = Self {
            start: 0.0,
            end: 0.0,
            pin: true,
            pin_viewports: pin_viewports.max(0.0),
        };
        trigger.refresh(viewport);
        trigger
    }

    pub fn from_config(config: &ScrollConfig, viewport: &Viewport) -> Self {
        Self {
            pin: config.pin,
            ..Self::new(config.pin_viewports, viewport)
        }
    }

    /// Recomputes the end of the range for a new viewport height.
    pub fn refresh(&mut self, viewport: &Viewport) {
        self.end = self.start + self.pin_viewports * viewport.height.max(0.0);
    }

    /// Scrollable length of the pinned range.
    pub fn length(&self) -> f32 {
        (self.end - self.start).max(0.0)
    }

    /// `clamp((offset − start) / (end − start), 0, 1)`. An empty range jumps straight to `1`
    /// once the offset passes `start`.
    pub fn progress(&self, offset: f32) -> f32 {
        let length = self.length();
        if length <= f32::EPSILON {
            return if offset > self.start { 1.0 } else { 0.0 };
        }
        ((offset - self.start) / length).clamp(0.0, 1.0)
    }

    /// Extra page height the pinned section needs below it so the whole range can be
    /// scrolled through. Zero when not pinned.
    pub fn pin_spacing(&self) -> f32 {
        if self.pin {
            self.length()
        } else {
            0.0
        }
    }

    /// How far to shift the section down at `offset` so it stays fixed on screen. Grows with
    /// the scroll inside the range, stays at its maximum past the end, and is zero before the
    /// start or when not pinned.
    pub fn pin_translation(&self, offset: f32) -> f32 {
        if !self.pin {
            return 0.0;
        }
        (offset - self.start).clamp(0.0, self.length())
    }
}

/// Which camera target the timeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Narrow,
    Wide,
}

impl Layout {
    pub fn for_width(width: f32, breakpoint: f32) -> Self {
        if width < breakpoint {
            Layout::Narrow
        } else {
            Layout::Wide
        }
    }
}

/// Every animated value at one scroll position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineFrame {
    pub progress: f32,
    pub camera_position: glm::Vec3,
    pub overlay: OverlayStyle,
}

/// The scrubbed hero timeline.
#[derive(Debug, Clone)]
pub struct ScrollTimeline {
    trigger: ScrollTrigger,
    layout: Layout,
    camera: Tween<glm::Vec3>,
    opacity: Tween<f32>,
    blur: Tween<f32>,
    scale: Tween<f32>,
    killed: bool,
}

impl ScrollTimeline {
    /// Builds the timeline for the current viewport, starting from `initial_camera`.
    pub fn new(config: &ScrollConfig, viewport: &Viewport, initial_camera: glm::Vec3) -> Self {
        let layout = Layout::for_width(viewport.width, config.breakpoint);
        let target = match layout {
            Layout::Narrow => config.narrow_camera_target,
            Layout::Wide => config.wide_camera_target,
        };
        let initial = OverlayStyle::default();

        Self {
            trigger: ScrollTrigger::from_config(config, viewport),
            layout,
            camera: Tween::new(initial_camera, glm::Vec3::from(target)),
            opacity: Tween::new(initial.opacity, config.overlay_opacity),
            blur: Tween::new(initial.blur_px, config.overlay_blur),
            scale: Tween::new(initial.scale, config.overlay_scale),
            killed: false,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn trigger(&self) -> &ScrollTrigger {
        &self.trigger
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    /// Recomputes the pinned range after a resize. The layout is left as it was.
    pub fn refresh(&mut self, viewport: &Viewport) {
        if !self.killed {
            self.trigger.refresh(viewport);
        }
    }

    /// Evaluates every track at `offset`. Returns `None` once the timeline is killed.
    pub fn scrub(&self, offset: f32) -> Option<TimelineFrame> {
        if self.killed {
            return None;
        }
        let progress = self.trigger.progress(offset);
        Some(TimelineFrame {
            progress,
            camera_position: self.camera.at(progress),
            overlay: OverlayStyle {
                opacity: self.opacity.at(progress),
                blur_px: self.blur.at(progress),
                scale: self.scale.at(progress),
            },
        })
    }

    /// Stops the timeline. Later scrubs return `None`.
    pub fn kill(&mut self) {
        self.killed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initial_camera() -> glm::Vec3 {
        glm::vec3(0.0, 0.1, 19.0)
    }

    fn wide() -> Viewport {
        Viewport::new(1280.0, 800.0, 1.0)
    }

    #[test]
    fn progress_is_clamped() {
        let trigger = ScrollTrigger::new(1.0, &wide());
        assert_eq!(trigger.progress(-50.0), 0.0);
        assert_eq!(trigger.progress(400.0), 0.5);
        assert_eq!(trigger.progress(5_000.0), 1.0);
    }

    #[test]
    fn pinned_section_tracks_the_scroll_inside_the_range() {
        let trigger = ScrollTrigger::new(1.0, &wide());
        assert!(trigger.pin);
        assert_eq!(trigger.pin_spacing(), 800.0);

        assert_eq!(trigger.pin_translation(-120.0), 0.0);
        assert_eq!(trigger.pin_translation(0.0), 0.0);
        assert_eq!(trigger.pin_translation(350.0), 350.0);
        assert_eq!(trigger.pin_translation(800.0), 800.0);
        // Past the end the section scrolls away with the page again.
        assert_eq!(trigger.pin_translation(1_500.0), 800.0);
    }

    #[test]
    fn unpinned_section_scrolls_with_the_page() {
        let config = ScrollConfig {
            pin: false,
            ..ScrollConfig::default()
        };
        let trigger = ScrollTrigger::from_config(&config, &wide());
        assert!(!trigger.pin);
        assert_eq!(trigger.pin_spacing(), 0.0);
        assert_eq!(trigger.pin_translation(350.0), 0.0);
        assert_eq!(trigger.progress(400.0), 0.5);
    }

    #[test]
    fn breakpoint_picks_the_camera_target() {
        let config = ScrollConfig::default();
        let narrow = ScrollTimeline::new(&config, &Viewport::new(767.0, 800.0, 1.0), initial_camera());
        let wide = ScrollTimeline::new(&config, &Viewport::new(768.0, 800.0, 1.0), initial_camera());

        assert_eq!(narrow.layout(), Layout::Narrow);
        assert_eq!(wide.layout(), Layout::Wide);
        assert_eq!(narrow.scrub(10_000.0).unwrap().camera_position, glm::vec3(0.0, -0.6, 42.0));
        assert_eq!(wide.scrub(10_000.0).unwrap().camera_position, glm::vec3(0.0, -1.2, 30.0));
    }

    #[test]
    fn scrubbing_back_to_zero_restores_initial_values() {
        let timeline = ScrollTimeline::new(&ScrollConfig::default(), &wide(), initial_camera());

        let middle = timeline.scrub(200.0).unwrap();
        assert!(middle.overlay.opacity < 1.0);
        assert!(middle.overlay.blur_px > 0.0);

        let back = timeline.scrub(0.0).unwrap();
        assert_eq!(back.camera_position, initial_camera());
        assert_eq!(back.overlay, OverlayStyle::default());
    }

    #[test]
    fn tracks_stay_in_lockstep() {
        let timeline = ScrollTimeline::new(&ScrollConfig::default(), &wide(), initial_camera());
        let frame = timeline.scrub(400.0).unwrap();

        assert_eq!(frame.progress, 0.5);
        assert!((frame.overlay.opacity - 0.5).abs() < 1e-6);
        assert!((frame.overlay.blur_px - 6.0).abs() < 1e-6);
        assert!((frame.overlay.scale - 0.925).abs() < 1e-6);
        assert!((frame.camera_position.z - 24.5).abs() < 1e-5);
    }

    #[test]
    fn refresh_follows_viewport_height() {
        let mut timeline = ScrollTimeline::new(&ScrollConfig::default(), &wide(), initial_camera());
        timeline.refresh(&Viewport::new(1280.0, 400.0, 1.0));
        assert_eq!(timeline.trigger().end, 400.0);
        assert_eq!(timeline.layout(), Layout::Wide);
    }

    #[test]
    fn killed_timeline_stops_scrubbing() {
        let mut timeline = ScrollTimeline::new(&ScrollConfig::default(), &wide(), initial_camera());
        timeline.kill();
        assert!(timeline.is_killed());
        assert!(timeline.scrub(100.0).is_none());
    }
}
