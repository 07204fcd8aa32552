//! Millisecond clocks: `performance.now()` in the browser, a hand-driven one in tests.

use std::cell::Cell;
use std::rc::Rc;

use web_sys::window;

pub trait Clock {
    fn now_ms(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

/// Browser high resolution time. Reads 0.0 when no window / performance is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }
}

/// Virtual clock; share it through an `Rc` to advance time from the outside.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self { now: Cell::new(start_ms) }
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_through_rc() {
        let clock = Rc::new(ManualClock::new(10.0));
        let shared: Rc<ManualClock> = clock.clone();
        clock.advance(5.5);
        assert_eq!(shared.now_ms(), 15.5);
        clock.set(2.0);
        assert_eq!(shared.now_ms(), 2.0);
    }
}
