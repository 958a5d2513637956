//! # Hero Section Scroll (web only)
//!
//! Binds the browser's page scroll to the planet's scroll timeline. On the web the hero
//! section (the element matching [`PlanetConfig::hero_selector`](crate::PlanetConfig)) is
//! what the timeline scrubs over, so [`HeroScroll`] listens to the window's `scroll` event,
//! measures how far the page has scrolled past the section's top, and forwards that offset to
//! [`PageEvents::emit_scroll`].
//!
//! ## Pinning
//!
//! While the range plays the section is held on screen. [`HeroScroll`] does this the way a
//! scroll-trigger library does:
//!
//! - a `margin-bottom` of [`ScrollTrigger::pin_spacing`] pixels gives the page room to scroll
//!   through the whole range,
//! - a `transform: translateY(..)` of [`ScrollTrigger::pin_translation`] pixels cancels the
//!   scroll so the section stays put, then releases it past the end.
//!
//! Both styles are removed again when the binding is dropped.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;

use crate::config::ScrollConfig;
use crate::events::PageEvents;
use crate::timeline::ScrollTrigger;
use crate::viewport::Viewport;

/// The window `scroll` listener and the hero section it measures.
///
/// # Fields
/// - `inner`: shared measuring state, also reached from the listener through a `Weak`.
/// - `listener`: the JS closure registered on the window. Kept alive for as long as the
///   binding exists and unregistered on drop.
pub struct HeroScroll {
    inner: Rc<Inner>,
    listener: Closure<dyn FnMut()>,
}

struct Inner {
    window: web_sys::Window,
    section: web_sys::HtmlElement,
    page: Weak<PageEvents>,
    config: ScrollConfig,
    trigger: Cell<ScrollTrigger>,
    section_top: Cell<f32>,
}

impl HeroScroll {
    /// Finds the section matching `selector` and starts forwarding page scroll to `page`.
    ///
    /// Returns `None` when there is no browser window or no such section; the timeline then
    /// stays at its start.
    pub fn attach(
        selector: &str,
        config: &ScrollConfig,
        viewport: Viewport,
        page: &Rc<PageEvents>,
    ) -> Option<Self> {
        let window = web_sys::window()?;
        let section = window
            .document()?
            .query_selector(selector)
            .ok()
            .flatten()?
            .dyn_into::<web_sys::HtmlElement>()
            .ok()?;

        let inner = Rc::new(Inner {
            window,
            section,
            page: Rc::downgrade(page),
            config: config.clone(),
            trigger: Cell::new(ScrollTrigger::from_config(config, &viewport)),
            section_top: Cell::new(0.0),
        });

        let listener = Closure::<dyn FnMut()>::new({
            let inner = Rc::downgrade(&inner);
            move || {
                if let Some(inner) = inner.upgrade() {
                    inner.sync();
                }
            }
        });
        if let Err(error) = inner
            .window
            .add_event_listener_with_callback("scroll", listener.as_ref().unchecked_ref())
        {
            log::warn!("Failed to listen to page scroll: {error:?}");
        }

        inner.refresh(viewport);
        log::info!("Scroll timeline bound to `{selector}`");
        Some(Self { inner, listener })
    }

    /// Re-measures the section and the pinned range for a new viewport, then re-emits the
    /// current offset.
    pub fn refresh(&self, viewport: Viewport) {
        self.inner.refresh(viewport);
    }
}

impl Drop for HeroScroll {
    fn drop(&mut self) {
        if let Err(error) = self
            .inner
            .window
            .remove_event_listener_with_callback("scroll", self.listener.as_ref().unchecked_ref())
        {
            log::warn!("Failed to remove the page scroll listener: {error:?}");
        }
        self.inner.clear_style("transform");
        self.inner.clear_style("margin-bottom");
    }
}

impl Inner {
    fn scroll_y(&self) -> f32 {
        self.window.scroll_y().unwrap_or(0.0) as f32
    }

    fn refresh(&self, viewport: Viewport) {
        // Measure without our own shift applied.
        self.clear_style("transform");
        let rect = self.section.get_bounding_client_rect();
        self.section_top.set(rect.top() as f32 + self.scroll_y());

        let trigger = ScrollTrigger::from_config(&self.config, &viewport);
        self.trigger.set(trigger);
        self.set_style("margin-bottom", &format!("{}px", trigger.pin_spacing()));
        self.sync();
    }

    /// Applies the pin shift for the current scroll position and emits the offset.
    fn sync(&self) {
        let offset = self.scroll_y() - self.section_top.get();
        let shift = self.trigger.get().pin_translation(offset);
        self.set_style("transform", &format!("translateY({shift}px)"));

        if let Some(page) = self.page.upgrade() {
            page.emit_scroll(offset);
        }
    }

    fn set_style(&self, property: &str, value: &str) {
        if let Err(error) = self.section.style().set_property(property, value) {
            log::debug!("Failed to set {property} on the hero section: {error:?}");
        }
    }

    fn clear_style(&self, property: &str) {
        if let Err(error) = self.section.style().remove_property(property) {
            log::debug!("Failed to clear {property} on the hero section: {error:?}");
        }
    }
}
