use super::*;

use std::cell::RefCell;
use std::rc::Rc;

use scrollscope_core::{PositionRecord, Rect, TimerHost};
use scrollscope_testing::{TestClock, TestTimerHost};

fn record_at(time_ms: f64) -> Rc<PositionRecord> {
    Rc::new(PositionRecord {
        rect: Rect::new(0.0, 0.0, 100.0, 100.0),
        intersection_ratio: 1.0,
        is_intersecting: true,
        time_ms,
        scroll_x: 0.0,
        scroll_y: 0.0,
        relative_rect: None,
    })
}

struct Rig {
    clock: Rc<TestClock>,
    timers: Rc<TestTimerHost>,
    delivered: Rc<RefCell<Vec<Rc<PositionRecord>>>>,
    throttle: Throttle,
}

fn rig(window_ms: f64) -> Rig {
    let clock = Rc::new(TestClock::new());
    let timers = Rc::new(TestTimerHost::new(Rc::clone(&clock)));
    let delivered: Rc<RefCell<Vec<Rc<PositionRecord>>>> = Rc::new(RefCell::new(Vec::new()));
    let throttle = Throttle::new(
        window_ms,
        Rc::clone(&timers) as Rc<dyn TimerHost>,
        {
            let delivered = Rc::clone(&delivered);
            Rc::new(move |record| delivered.borrow_mut().push(record))
        },
    );
    Rig {
        clock,
        timers,
        delivered,
        throttle,
    }
}

#[test]
fn zero_window_publishes_everything_immediately() {
    let rig = rig(0.0);
    rig.throttle.publish(record_at(0.0));
    rig.throttle.publish(record_at(1.0));
    assert_eq!(rig.delivered.borrow().len(), 2);
}

#[test]
fn trailing_edge_carries_the_last_value() {
    let rig = rig(16.0);

    rig.throttle.publish(record_at(0.0));
    rig.clock.set(5.0);
    rig.throttle.publish(record_at(5.0));
    rig.clock.set(10.0);
    rig.throttle.publish(record_at(10.0));

    // Leading publish only so far.
    assert_eq!(rig.delivered.borrow().len(), 1);
    assert_eq!(rig.delivered.borrow()[0].time_ms, 0.0);

    rig.clock.set(16.0);
    rig.timers.run_due();

    let delivered = rig.delivered.borrow();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[1].time_ms, 10.0);
}

#[test]
fn window_reopens_after_trailing_publish() {
    let rig = rig(16.0);

    rig.throttle.publish(record_at(0.0));
    rig.clock.set(10.0);
    rig.throttle.publish(record_at(10.0));
    rig.clock.set(16.0);
    rig.timers.run_due();
    assert_eq!(rig.delivered.borrow().len(), 2);

    // Next window starts at the trailing publish, not the stashed value.
    rig.clock.set(20.0);
    rig.throttle.publish(record_at(20.0));
    assert_eq!(rig.delivered.borrow().len(), 2);
    rig.clock.set(32.0);
    rig.timers.run_due();
    assert_eq!(rig.delivered.borrow().len(), 3);
    assert_eq!(rig.delivered.borrow()[2].time_ms, 20.0);
}

#[test]
fn publish_after_open_window_is_immediate() {
    let rig = rig(16.0);
    rig.throttle.publish(record_at(0.0));
    rig.clock.set(20.0);
    rig.throttle.publish(record_at(20.0));
    assert_eq!(rig.delivered.borrow().len(), 2);
    assert_eq!(rig.timers.pending_count(), 0);
}

#[test]
fn cancel_drops_the_pending_trailing_value() {
    let rig = rig(16.0);
    rig.throttle.publish(record_at(0.0));
    rig.clock.set(10.0);
    rig.throttle.publish(record_at(10.0));
    rig.throttle.cancel();
    assert_eq!(rig.timers.pending_count(), 0);

    rig.clock.set(16.0);
    rig.timers.run_due();
    assert_eq!(rig.delivered.borrow().len(), 1);

    // Cancelled gates stay silent and cancel stays idempotent.
    rig.throttle.publish(record_at(30.0));
    rig.throttle.cancel();
    assert_eq!(rig.delivered.borrow().len(), 1);
}

#[test]
fn stale_record_does_not_replace_a_newer_pending_one() {
    let rig = rig(16.0);
    rig.throttle.publish(record_at(0.0));
    rig.clock.set(10.0);
    rig.throttle.publish(record_at(10.0));
    rig.throttle.publish(record_at(4.0));
    rig.clock.set(16.0);
    rig.timers.run_due();
    assert_eq!(rig.delivered.borrow()[1].time_ms, 10.0);
}
