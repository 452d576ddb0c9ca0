//! Manually advanced clock for deterministic tests.

use std::cell::Cell;

use scrollscope_core::Clock;

/// A clock that only moves when the test says so.
#[derive(Default)]
pub struct TestClock {
    now_ms: Cell<f64>,
}

impl TestClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now_ms.set(self.now_ms.get() + delta_ms);
    }

    pub fn set(&self, now_ms: f64) {
        self.now_ms.set(now_ms);
    }
}

impl Clock for TestClock {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }
}
