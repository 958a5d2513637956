//! # Ticker
//!
//! A shared per-frame clock that many subscribers can hook into, in the spirit of an
//! animation library's global ticker. The application shell calls [`Ticker::tick`] once per
//! display frame; every registered callback then receives the same [`Tick`].
//!
//! Subscribers only see the [`Scheduler`] trait, which lets the planet be mounted against
//! any frame source (the real ticker in the app, a hand-driven one in tests).
//!
//! ## Lag smoothing
//!
//! When the gap between two ticks exceeds the configured threshold (the tab was hidden, the
//! window was dragged, a breakpoint was hit), the reported delta is replaced by a small fixed
//! value so time-based animations do not jump. A zero threshold disables this, and that is
//! the default.
//!
//! Smoothing only shapes [`Tick::time`] and [`Tick::delta`]. The planet spins by a fixed step
//! per tick and never reads either, so its rotation follows the tick cadence whatever the
//! smoothing settings are.

use std::cell::RefCell;
use std::time::Duration;

use web_time::Instant;

use crate::config::TickerConfig;
use crate::events::{ListenerId, Listeners};

/// One frame of the shared clock.
///
/// # Fields
/// - `frame`: number of ticks before this one.
/// - `time`: smoothed time since the first tick.
/// - `delta`: smoothed time since the previous tick (zero on the first tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub frame: u64,
    pub time: Duration,
    pub delta: Duration,
}

/// Something that calls registered callbacks once per frame.
pub trait Scheduler {
    /// Registers a per-frame callback.
    fn add(&self, callback: Box<dyn FnMut(&Tick)>) -> ListenerId;

    /// Unregisters a callback. Returns `false` when `id` was not registered.
    fn remove(&self, id: ListenerId) -> bool;
}

/// Gap clamping applied to the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagSmoothing {
    pub threshold: Duration,
    pub adjusted_lag: Duration,
}

impl LagSmoothing {
    pub const DISABLED: Self = Self {
        threshold: Duration::ZERO,
        adjusted_lag: Duration::ZERO,
    };

    pub fn is_enabled(&self) -> bool {
        !self.threshold.is_zero()
    }

    /// Returns the delta to report for a real gap of `elapsed`.
    pub fn smooth(&self, elapsed: Duration) -> Duration {
        if self.is_enabled() && elapsed > self.threshold {
            self.adjusted_lag
        } else {
            elapsed
        }
    }
}

impl From<&TickerConfig> for LagSmoothing {
    fn from(config: &TickerConfig) -> Self {
        Self {
            threshold: Duration::from_millis(config.lag_threshold_ms),
            adjusted_lag: Duration::from_millis(config.adjusted_lag_ms),
        }
    }
}

#[derive(Debug, Default)]
struct Clock {
    last: Option<Instant>,
    time: Duration,
    frame: u64,
}

/// The shared frame clock.
pub struct Ticker {
    listeners: Listeners<Tick>,
    clock: RefCell<Clock>,
    lag_smoothing: LagSmoothing,
}

impl Ticker {
    pub fn new(lag_smoothing: LagSmoothing) -> Self {
        Self {
            listeners: Listeners::default(),
            clock: RefCell::new(Clock::default()),
            lag_smoothing,
        }
    }

    pub fn lag_smoothing(&self) -> LagSmoothing {
        self.lag_smoothing
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Advances the clock to `now` and calls every subscriber with the resulting [`Tick`].
    pub fn tick(&self, now: Instant) -> Tick {
        let tick = {
            let mut clock = self.clock.borrow_mut();
            let delta = match clock.last {
                Some(last) => self.lag_smoothing.smooth(now.saturating_duration_since(last)),
                None => Duration::ZERO,
            };
            clock.last = Some(now);
            clock.time += delta;

            let tick = Tick {
                frame: clock.frame,
                time: clock.time,
                delta,
            };
            clock.frame += 1;
            tick
        };

        self.listeners.emit(&tick);
        tick
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(LagSmoothing::from(&TickerConfig::default()))
    }
}

impl Scheduler for Ticker {
    fn add(&self, callback: Box<dyn FnMut(&Tick)>) -> ListenerId {
        self.listeners.add_boxed(callback)
    }

    fn remove(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter(ticker: &Ticker) -> (ListenerId, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let id = ticker.add(Box::new({
            let count = count.clone();
            move |_: &Tick| count.set(count.get() + 1)
        }));
        (id, count)
    }

    #[test]
    fn instances_are_removed_individually() {
        let ticker = Ticker::default();
        let (first, first_count) = counter(&ticker);
        let (_second, second_count) = counter(&ticker);

        let start = Instant::now();
        ticker.tick(start);
        assert!(ticker.remove(first));
        ticker.tick(start + Duration::from_millis(16));

        assert_eq!(first_count.get(), 1);
        assert_eq!(second_count.get(), 2);
        assert_eq!(ticker.subscriber_count(), 1);
    }

    #[test]
    fn default_ticker_reports_real_gaps() {
        let ticker = Ticker::default();
        assert!(!ticker.lag_smoothing().is_enabled());

        let start = Instant::now();
        ticker.tick(start);
        let stalled = ticker.tick(start + Duration::from_secs(2));
        assert_eq!(stalled.delta, Duration::from_secs(2));
    }

    #[test]
    fn long_gaps_are_smoothed() {
        let ticker = Ticker::new(LagSmoothing {
            threshold: Duration::from_millis(500),
            adjusted_lag: Duration::from_millis(33),
        });
        let start = Instant::now();

        let first = ticker.tick(start);
        let normal = ticker.tick(start + Duration::from_millis(16));
        let stalled = ticker.tick(start + Duration::from_millis(16 + 2_000));

        assert_eq!(first.delta, Duration::ZERO);
        assert_eq!(normal.delta, Duration::from_millis(16));
        assert_eq!(stalled.delta, Duration::from_millis(33));
        assert_eq!(stalled.time, Duration::from_millis(49));
        assert_eq!(stalled.frame, 2);
    }

    #[test]
    fn zero_threshold_disables_smoothing() {
        let ticker = Ticker::new(LagSmoothing::DISABLED);
        let start = Instant::now();
        ticker.tick(start);
        let stalled = ticker.tick(start + Duration::from_secs(3));
        assert_eq!(stalled.delta, Duration::from_secs(3));
    }

    #[test]
    fn callback_can_remove_itself_mid_tick() {
        let ticker = Rc::new(Ticker::default());
        let slot = Rc::new(Cell::new(None));
        let calls = Rc::new(Cell::new(0));

        let id = ticker.add(Box::new({
            let ticker = Rc::downgrade(&ticker);
            let slot = slot.clone();
            let calls = calls.clone();
            move |_: &Tick| {
                calls.set(calls.get() + 1);
                if let (Some(ticker), Some(id)) = (ticker.upgrade(), slot.get()) {
                    ticker.remove(id);
                }
            }
        }));
        slot.set(Some(id));

        let start = Instant::now();
        ticker.tick(start);
        ticker.tick(start + Duration::from_millis(16));
        assert_eq!(calls.get(), 1);
        assert_eq!(ticker.subscriber_count(), 0);
    }
}
