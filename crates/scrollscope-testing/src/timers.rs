//! Deterministic timer queue driven by a [`TestClock`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use scrollscope_core::{Clock as _, TimerHost, TimerId};

use crate::clock::TestClock;

struct PendingTimer {
    id: TimerId,
    due_ms: f64,
    callback: Option<Box<dyn FnOnce()>>,
}

/// Timer host whose callbacks fire only from [`TestTimerHost::run_due`].
pub struct TestTimerHost {
    clock: Rc<TestClock>,
    next_id: Cell<u64>,
    queue: RefCell<Vec<PendingTimer>>,
}

impl TestTimerHost {
    pub fn new(clock: Rc<TestClock>) -> Self {
        Self {
            clock,
            next_id: Cell::new(1),
            queue: RefCell::new(Vec::new()),
        }
    }

    /// Fires every timer due at or before the clock's current time, in due
    /// order. Callbacks may schedule or cancel further timers.
    pub fn run_due(&self) {
        loop {
            let now = self.clock.now_ms();
            let next = {
                let mut queue = self.queue.borrow_mut();
                let due_index = queue
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due_ms <= now && timer.callback.is_some())
                    .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms))
                    .map(|(index, _)| index);
                match due_index {
                    Some(index) => {
                        let callback = queue[index].callback.take();
                        queue.remove(index);
                        callback
                    }
                    None => None,
                }
            };
            match next {
                Some(callback) => callback(),
                None => break,
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl TimerHost for TestTimerHost {
    fn schedule(&self, delay_ms: f64, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.queue.borrow_mut().push(PendingTimer {
            id,
            due_ms: self.clock.now_ms() + delay_ms,
            callback: Some(callback),
        });
        id
    }

    fn cancel(&self, id: TimerId) {
        self.queue.borrow_mut().retain(|timer| timer.id != id);
    }
}
