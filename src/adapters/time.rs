//! Clock adapter.
//!
//! [`ManualClock`] is advanced explicitly; clones share the same time, so
//! a test or replay driver can keep a handle while the service owns another.

use std::cell::Cell;
use std::rc::Rc;

use crate::app::ports::Clock;

/// Simulated clock for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
