//! # Input dispatcher
//! Debounces raw button edges into logical presses.
//!
//! Runs in interrupt context, so it takes no locks: each channel keeps the tick count of its
//! last dispatched press in an atomic. An edge becomes a press only if it is more than the
//! debounce window past that press. Absorbed edges do not move the window.
use crate::config::DEBOUNCE_WINDOW;
use crate::event::{Button, ButtonEvent};
use embassy_time::{Duration, Instant};
use portable_atomic::{AtomicBool, AtomicU64, Ordering};

/// Marks a channel that has not dispatched a press yet
const NEVER: u64 = u64::MAX;

/// Per-channel debouncing of button edges
pub struct InputDispatcher {
    /// Tick count of the last dispatched press, per channel
    last_dispatched: [AtomicU64; 3],
    /// Minimum spacing between two presses on one channel
    window: Duration,
    /// Edges are only dispatched while enabled
    enabled: AtomicBool,
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

impl InputDispatcher {
    /// Create a dispatcher with the given debounce window
    pub const fn new(window: Duration) -> Self {
        Self {
            last_dispatched: [
                AtomicU64::new(NEVER),
                AtomicU64::new(NEVER),
                AtomicU64::new(NEVER),
            ],
            window,
            enabled: AtomicBool::new(true),
        }
    }

    /// Handle a raw edge on `button`'s channel seen at `at`.
    ///
    /// Returns the logical press if the edge is dispatched. Edges are dropped, never queued.
    pub fn on_edge(&self, button: Button, at: Instant) -> Option<ButtonEvent> {
        if !self.is_enabled() {
            return None;
        }
        let slot = &self.last_dispatched[button.index()];
        let last = slot.load(Ordering::Acquire);
        let now = at.as_ticks();
        if last != NEVER && now.saturating_sub(last) <= self.window.as_ticks() {
            debug!("{} edge absorbed", button);
            return None;
        }
        // a concurrent edge on the same channel won, this one is part of its burst
        slot.compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(ButtonEvent { button, at })
    }

    /// Whether edges are dispatched
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Start dispatching edges
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Record `at` as the last dispatch on `button` without dispatching it, so the rest of
    /// the same press is absorbed.
    pub fn claim(&self, button: Button, at: Instant) {
        self.last_dispatched[button.index()].store(at.as_ticks(), Ordering::Release);
    }

    /// Stop dispatching edges. Forgets the last presses, so the first press after
    /// re-enabling is never absorbed.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
        for slot in &self.last_dispatched {
            slot.store(NEVER, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn edges_150ms_apart_dispatch_once() {
        let d = InputDispatcher::default();
        assert!(d.on_edge(Button::Green, at(1_000)).is_some());
        assert!(d.on_edge(Button::Green, at(1_150)).is_none());
    }

    #[test]
    fn edges_350ms_apart_dispatch_twice() {
        let d = InputDispatcher::default();
        assert!(d.on_edge(Button::Green, at(1_000)).is_some());
        assert!(d.on_edge(Button::Green, at(1_350)).is_some());
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let d = InputDispatcher::default();
        assert!(d.on_edge(Button::Blue, at(1_000)).is_some());
        assert!(d.on_edge(Button::Blue, at(1_300)).is_none());
        assert!(d.on_edge(Button::Blue, at(1_301)).is_some());
    }

    #[test]
    fn burst_counts_from_the_dispatched_edge() {
        let d = InputDispatcher::default();
        let dispatched = [0, 100, 200, 290, 310, 400, 500, 611]
            .iter()
            .filter(|&&ms| d.on_edge(Button::Yellow, at(ms + 5_000)).is_some())
            .count();
        // 5000, 5310, 5611
        assert_eq!(dispatched, 3);
    }

    #[test]
    fn channels_are_independent() {
        let d = InputDispatcher::default();
        assert!(d.on_edge(Button::Green, at(1_000)).is_some());
        assert!(d.on_edge(Button::Blue, at(1_010)).is_some());
        assert!(d.on_edge(Button::Yellow, at(1_020)).is_some());
        assert!(d.on_edge(Button::Green, at(1_030)).is_none());
    }

    #[test]
    fn first_press_after_boot_is_dispatched() {
        let d = InputDispatcher::default();
        let event = d.on_edge(Button::Green, at(10)).unwrap();
        assert_eq!(event.button, Button::Green);
        assert_eq!(event.at, at(10));
    }

    #[test]
    fn disabled_dispatcher_drops_everything() {
        let d = InputDispatcher::default();
        d.disable();
        assert!(d.on_edge(Button::Green, at(1_000)).is_none());
        d.enable();
        assert!(d.on_edge(Button::Green, at(1_010)).is_some());
    }

    #[test]
    fn claimed_edge_absorbs_its_bounces() {
        let d = InputDispatcher::default();
        d.disable();
        d.claim(Button::Blue, at(5_000));
        d.enable();
        assert!(d.on_edge(Button::Blue, at(5_005)).is_none());
        assert!(d.on_edge(Button::Blue, at(5_300)).is_none());
        assert!(d.on_edge(Button::Green, at(5_010)).is_some());
        assert!(d.on_edge(Button::Blue, at(5_301)).is_some());
    }
}
