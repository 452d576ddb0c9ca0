//! Leading+trailing throttled delivery.
//!
//! Rate-limits publishes to one per window while guaranteeing the most
//! recent record computed inside a window is never dropped: it is delivered
//! either immediately (window open) or by a trailing timer at the window's
//! close. Record timestamps are the sole arbiter of which value is newest.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use scrollscope_core::{PositionRecord, TimerHost, TimerId};

/// Consumer of published records.
pub type DeliverFn = Rc<dyn Fn(Rc<PositionRecord>)>;

struct ThrottleInner {
    alive: bool,
    last_publish_ms: Option<f64>,
    pending: Option<Rc<PositionRecord>>,
    trailing: Option<TimerId>,
    deliver: DeliverFn,
}

/// Per-target throttle gate in front of one consumer.
pub struct Throttle {
    window_ms: f64,
    timers: Rc<dyn TimerHost>,
    inner: Rc<RefCell<ThrottleInner>>,
}

impl Throttle {
    pub fn new(window_ms: f64, timers: Rc<dyn TimerHost>, deliver: DeliverFn) -> Self {
        Self {
            window_ms,
            timers,
            inner: Rc::new(RefCell::new(ThrottleInner {
                alive: true,
                last_publish_ms: None,
                pending: None,
                trailing: None,
                deliver,
            })),
        }
    }

    /// Publishes a record, immediately or via the trailing edge.
    pub fn publish(&self, record: Rc<PositionRecord>) {
        let now_ms = record.time_ms;
        let mut inner = self.inner.borrow_mut();
        if !inner.alive {
            return;
        }

        if self.window_ms <= 0.0 {
            inner.last_publish_ms = Some(now_ms);
            let deliver = Rc::clone(&inner.deliver);
            drop(inner);
            deliver(record);
            return;
        }

        let window_open = inner
            .last_publish_ms
            .is_none_or(|last| now_ms - last >= self.window_ms);
        if window_open && inner.trailing.is_none() {
            inner.last_publish_ms = Some(now_ms);
            let deliver = Rc::clone(&inner.deliver);
            drop(inner);
            deliver(record);
            return;
        }

        // Inside the window: keep the newest record and make sure exactly
        // one trailing delivery is scheduled for the window's close.
        let newer = inner
            .pending
            .as_ref()
            .is_none_or(|pending| record.time_ms >= pending.time_ms);
        if newer {
            inner.pending = Some(record);
        }
        if inner.trailing.is_none() {
            let due_ms = inner.last_publish_ms.unwrap_or(now_ms) + self.window_ms;
            let delay_ms = (due_ms - now_ms).max(0.0);
            let weak = Rc::downgrade(&self.inner);
            let id = self
                .timers
                .schedule(delay_ms, Box::new(move || fire_trailing(&weak, due_ms)));
            inner.trailing = Some(id);
        }
    }

    /// Drops the pending value and cancels the trailing timer. Idempotent;
    /// the gate delivers nothing after this.
    pub fn cancel(&self) {
        let trailing = {
            let mut inner = self.inner.borrow_mut();
            inner.alive = false;
            inner.pending = None;
            inner.trailing.take()
        };
        if let Some(id) = trailing {
            self.timers.cancel(id);
        }
    }
}

fn fire_trailing(inner: &Weak<RefCell<ThrottleInner>>, due_ms: f64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let delivery = {
        let mut inner = inner.borrow_mut();
        inner.trailing = None;
        if !inner.alive {
            None
        } else if let Some(record) = inner.pending.take() {
            inner.last_publish_ms = Some(due_ms);
            Some((Rc::clone(&inner.deliver), record))
        } else {
            None
        }
    };
    if let Some((deliver, record)) = delivery {
        deliver(record);
    }
}

#[cfg(test)]
#[path = "tests/throttle_tests.rs"]
mod tests;
