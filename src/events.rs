//! # Page Events
//!
//! Revocable listener registries for the two page-level events the planet reacts to:
//! viewport resizes and page scrolling.
//!
//! On the web these mirror `window.addEventListener("resize", ..)` and the scroll observer of
//! the timeline; on desktop the application shell emits them from `winit` window events.
//! Every registration returns a [`ListenerId`] that can later be handed back to remove it,
//! which is how the planet unregisters itself on teardown.
//!
//! ## Reentrancy
//!
//! [`Listeners::emit`] iterates over a snapshot of the registered callbacks, so a callback
//! may add or remove listeners (including itself) while an emit is in progress. A listener
//! removed during an emit is not called afterwards, even if it was part of the snapshot.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::viewport::Viewport;

/// Opaque handle identifying one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

/// An ordered list of callbacks receiving `&T`.
pub struct Listeners<T> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(ListenerId, Callback<T>)>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        }
    }
}

impl<T: 'static> Listeners<T> {
    pub fn add(&self, callback: impl FnMut(&T) + 'static) -> ListenerId {
        self.insert(Rc::new(RefCell::new(callback)))
    }

    pub fn add_boxed(&self, callback: Box<dyn FnMut(&T)>) -> ListenerId {
        self.insert(Rc::new(RefCell::new(callback)))
    }

    fn insert(&self, callback: Callback<T>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push((id, callback));
        id
    }

    /// Removes the registration. Returns `false` when `id` was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.borrow().iter().any(|(entry, _)| *entry == id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every registered callback with `value`, in registration order.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(ListenerId, Callback<T>)> = self.entries.borrow().clone();

        for (id, callback) in snapshot {
            if !self.contains(id) {
                continue;
            }
            // A callback that is already running further up the stack is skipped.
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (&mut *callback)(value);
            }
        }
    }
}

/// Resize and scroll registries plus the last value emitted on each.
#[derive(Default)]
pub struct PageEvents {
    pub resize: Listeners<Viewport>,
    pub scroll: Listeners<f32>,
    viewport: Cell<Viewport>,
    scroll_offset: Cell<f32>,
}

impl PageEvents {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport: Cell::new(viewport),
            ..Self::default()
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset.get()
    }

    pub fn emit_resize(&self, viewport: Viewport) {
        self.viewport.set(viewport);
        self.resize.emit(&viewport);
    }

    pub fn emit_scroll(&self, offset: f32) {
        self.scroll_offset.set(offset);
        self.scroll.emit(&offset);
    }
}

/// Desktop stand-in for the page's vertical scroll position.
///
/// The page is `max` logical pixels taller than the viewport; wheel input moves `offset`
/// inside `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageScroll {
    offset: f32,
    max: f32,
}

impl PageScroll {
    /// Pixels scrolled per wheel "line".
    pub const LINE_HEIGHT: f32 = 40.0;

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Updates the scrollable range, clamping the current offset into it.
    pub fn set_max(&mut self, max: f32) {
        self.max = max.max(0.0);
        self.offset = self.offset.min(self.max);
    }

    /// Scrolls by `delta` pixels (positive is down). Returns `true` when the offset changed.
    pub fn scroll_by(&mut self, delta: f32) -> bool {
        let next = (self.offset + delta).clamp(0.0, self.max);
        let changed = next != self.offset;
        self.offset = next;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_are_called_in_order_until_removed() {
        let listeners = Listeners::<u32>::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = listeners.add({
            let log = log.clone();
            move |v: &u32| log.borrow_mut().push(("first", *v))
        });
        listeners.add({
            let log = log.clone();
            move |v: &u32| log.borrow_mut().push(("second", *v))
        });

        listeners.emit(&1);
        assert!(listeners.remove(first));
        assert!(!listeners.remove(first));
        listeners.emit(&2);

        assert_eq!(*log.borrow(), vec![("first", 1), ("second", 1), ("second", 2)]);
    }

    #[test]
    fn removal_during_emit_is_honored() {
        let listeners = Rc::new(Listeners::<()>::default());
        let calls = Rc::new(Cell::new(0));
        let victim = Rc::new(Cell::new(None));

        listeners.add({
            let listeners = Rc::downgrade(&listeners);
            let victim = victim.clone();
            move |_: &()| {
                if let (Some(listeners), Some(id)) = (listeners.upgrade(), victim.get()) {
                    listeners.remove(id);
                }
            }
        });
        let id = listeners.add({
            let calls = calls.clone();
            move |_: &()| calls.set(calls.get() + 1)
        });
        victim.set(Some(id));

        listeners.emit(&());
        assert_eq!(calls.get(), 0);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn boxed_listeners_work_for_owned_payloads() {
        fn forward<T: Clone + 'static>(listeners: &Listeners<T>, sink: Rc<RefCell<Vec<T>>>) -> ListenerId {
            listeners.add_boxed(Box::new(move |value: &T| sink.borrow_mut().push(value.clone())))
        }

        let listeners = Listeners::<String>::default();
        let sink = Rc::new(RefCell::new(Vec::new()));
        let id = forward(&listeners, sink.clone());

        listeners.emit(&"hero".to_owned());
        assert!(listeners.remove(id));
        listeners.emit(&"ignored".to_owned());

        assert_eq!(*sink.borrow(), vec!["hero".to_owned()]);
    }

    #[test]
    fn page_events_remember_last_values() {
        let page = PageEvents::new(Viewport::new(800.0, 600.0, 1.0));
        let seen = Rc::new(Cell::new(0.0));
        page.scroll.add({
            let seen = seen.clone();
            move |offset: &f32| seen.set(*offset)
        });

        page.emit_scroll(120.0);
        page.emit_resize(Viewport::new(400.0, 300.0, 2.0));

        assert_eq!(seen.get(), 120.0);
        assert_eq!(page.scroll_offset(), 120.0);
        assert_eq!(page.viewport().width, 400.0);
    }

    #[test]
    fn page_scroll_clamps_to_range() {
        let mut scroll = PageScroll::default();
        scroll.set_max(100.0);
        assert!(scroll.scroll_by(80.0));
        assert!(scroll.scroll_by(80.0));
        assert_eq!(scroll.offset(), 100.0);
        assert!(!scroll.scroll_by(10.0));
        scroll.set_max(50.0);
        assert_eq!(scroll.offset(), 50.0);
        assert!(scroll.scroll_by(-500.0));
        assert_eq!(scroll.offset(), 0.0);
    }
}
