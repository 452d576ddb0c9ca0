use super::*;

use scrollscope_core::{EdgeInsets, IntersectionBackend, ObserverConfig, Rect, Size, TargetId};
use scrollscope_testing::{FakeBackend, TestViewportHost};

const VIEWPORT: Size = Size::new(400.0, 600.0);

fn setup() -> (Rc<TestViewportHost>, Rc<FakeBackend>, ObservationRegistry) {
    let host = Rc::new(TestViewportHost::new(VIEWPORT));
    let backend = Rc::new(FakeBackend::new(Rc::clone(&host)));
    let registry =
        ObservationRegistry::new(Rc::clone(&backend) as Rc<dyn IntersectionBackend>);
    (host, backend, registry)
}

fn config(thresholds: Vec<f32>) -> ObserverConfig {
    ObserverConfig {
        thresholds,
        margin: EdgeInsets::default(),
        root: None,
    }
}

fn collect() -> (Rc<RefCell<Vec<TrackedEntry>>>, EntryCallback) {
    let seen: Rc<RefCell<Vec<TrackedEntry>>> = Rc::new(RefCell::new(Vec::new()));
    let callback: EntryCallback = {
        let seen = Rc::clone(&seen);
        Rc::new(move |entry| seen.borrow_mut().push(entry.clone()))
    };
    (seen, callback)
}

#[test]
fn identical_configs_pool_one_source() {
    let (host, backend, registry) = setup();
    host.place_target(TargetId(1), Rect::new(0.0, 0.0, 50.0, 50.0));
    host.place_target(TargetId(2), Rect::new(0.0, 100.0, 50.0, 50.0));

    let (_, callback_a) = collect();
    let (_, callback_b) = collect();
    let _a = registry.observe(TargetId(1), &config(vec![0.0, 1.0]), false, callback_a);
    let _b = registry.observe(TargetId(2), &config(vec![0.0, 1.0]), false, callback_b);

    assert_eq!(backend.instance_count(), 1);
    assert_eq!(registry.pool_count(), 1);
}

#[test]
fn distinct_configs_get_distinct_sources() {
    let (host, backend, registry) = setup();
    host.place_target(TargetId(1), Rect::new(0.0, 0.0, 50.0, 50.0));

    let (_, callback_a) = collect();
    let (_, callback_b) = collect();
    let _a = registry.observe(TargetId(1), &config(vec![0.0, 1.0]), false, callback_a);
    let _b = registry.observe(TargetId(1), &config(vec![0.0, 0.5, 1.0]), false, callback_b);

    assert_eq!(backend.instance_count(), 2);
    assert_eq!(registry.pool_count(), 2);
}

#[test]
fn entries_are_enriched_with_direction_and_previous_rect() {
    let (host, backend, registry) = setup();
    host.place_target(TargetId(1), Rect::new(0.0, 100.0, 100.0, 100.0));

    let (seen, callback) = collect();
    let _subscription = registry.observe(TargetId(1), &config(vec![0.0, 1.0]), false, callback);

    backend.fire_all(0.0);
    host.set_scroll(0.0, 50.0); // target moves up on screen
    backend.fire_all(16.0);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].scroll_direction, ScrollDirection::None);
    assert!(seen[0].previous_rect.is_none());
    assert_eq!(seen[1].scroll_direction, ScrollDirection::Up);
    assert_eq!(seen[1].previous_rect, Some(Rect::new(0.0, 100.0, 100.0, 100.0)));
    assert_eq!(seen[1].entry.bounding_rect, Rect::new(0.0, 50.0, 100.0, 100.0));
}

#[test]
fn one_shot_auto_unobserves_and_drains_the_pool() {
    let (host, backend, registry) = setup();
    host.place_target(TargetId(1), Rect::new(0.0, 100.0, 100.0, 100.0));

    let (seen, callback) = collect();
    let subscription = registry.observe(TargetId(1), &config(vec![0.0, 1.0]), true, callback);

    backend.fire_all(0.0);
    assert_eq!(seen.borrow().len(), 1);
    assert!(seen.borrow()[0].entry.is_intersecting);
    assert!(!subscription.is_active());
    assert_eq!(registry.pool_count(), 0);

    backend.fire_all(16.0);
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn one_shot_stays_subscribed_while_not_intersecting() {
    let (host, backend, registry) = setup();
    host.place_target(TargetId(1), Rect::new(0.0, 5000.0, 100.0, 100.0));

    let (seen, callback) = collect();
    let subscription = registry.observe(TargetId(1), &config(vec![0.0, 1.0]), true, callback);

    backend.fire_all(0.0);
    assert_eq!(seen.borrow().len(), 1);
    assert!(subscription.is_active());
    assert_eq!(registry.pool_count(), 1);
}

#[test]
fn cancel_is_idempotent_and_purges_state() {
    let (host, backend, registry) = setup();
    host.place_target(TargetId(1), Rect::new(0.0, 0.0, 50.0, 50.0));

    let (seen, callback) = collect();
    let subscription = registry.observe(TargetId(1), &config(vec![0.0, 1.0]), false, callback);
    backend.fire_all(0.0);

    subscription.cancel();
    subscription.cancel();
    assert!(!subscription.is_active());
    assert_eq!(registry.pool_count(), 0);

    backend.fire_all(16.0);
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn cancelling_inside_the_callback_does_not_panic() {
    let (host, backend, registry) = setup();
    host.place_target(TargetId(1), Rect::new(0.0, 0.0, 50.0, 50.0));

    let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let callback: EntryCallback = {
        let slot = Rc::clone(&slot);
        Rc::new(move |_| {
            if let Some(subscription) = slot.borrow_mut().take() {
                subscription.cancel();
            }
        })
    };
    let subscription = registry.observe(TargetId(1), &config(vec![0.0, 1.0]), false, callback);
    *slot.borrow_mut() = Some(subscription);

    backend.fire_all(0.0);
    assert_eq!(registry.pool_count(), 0);
}

#[test]
fn reobserving_a_target_replaces_the_previous_subscriber() {
    let (host, backend, registry) = setup();
    host.place_target(TargetId(1), Rect::new(0.0, 0.0, 50.0, 50.0));

    let (first_seen, first_callback) = collect();
    let first = registry.observe(TargetId(1), &config(vec![0.0, 1.0]), false, first_callback);
    let (second_seen, second_callback) = collect();
    let _second = registry.observe(TargetId(1), &config(vec![0.0, 1.0]), false, second_callback);

    assert!(!first.is_active());
    assert_eq!(backend.instance_count(), 1);

    backend.fire_all(0.0);
    assert_eq!(first_seen.borrow().len(), 0);
    assert_eq!(second_seen.borrow().len(), 1);

    // The stale handle must not tear down the replacement.
    first.cancel();
    assert_eq!(registry.pool_count(), 1);
    backend.fire_all(16.0);
    assert_eq!(second_seen.borrow().len(), 2);
}

#[test]
fn disconnect_tears_down_every_pool() {
    let (host, backend, registry) = setup();
    host.place_target(TargetId(1), Rect::new(0.0, 0.0, 50.0, 50.0));
    host.place_target(TargetId(2), Rect::new(0.0, 100.0, 50.0, 50.0));

    let (seen_a, callback_a) = collect();
    let (seen_b, callback_b) = collect();
    let a = registry.observe(TargetId(1), &config(vec![0.0, 1.0]), false, callback_a);
    let b = registry.observe(TargetId(2), &config(vec![0.0, 0.5, 1.0]), false, callback_b);

    registry.disconnect();
    assert_eq!(registry.pool_count(), 0);
    assert!(!a.is_active());
    assert!(!b.is_active());

    backend.fire_all(0.0);
    assert!(seen_a.borrow().is_empty());
    assert!(seen_b.borrow().is_empty());

    // Cancelling after teardown stays a no-op.
    a.cancel();
    b.cancel();
}

#[test]
fn fallback_backend_reports_through_the_registry() {
    use crate::fallback::FallbackBackend;
    use scrollscope_core::ViewportHost;

    let host = Rc::new(TestViewportHost::new(VIEWPORT));
    let backend = Rc::new(FallbackBackend::new(
        Rc::clone(&host) as Rc<dyn ViewportHost>
    ));
    let registry =
        ObservationRegistry::new(Rc::clone(&backend) as Rc<dyn IntersectionBackend>);
    host.place_target(TargetId(1), Rect::new(0.0, 700.0, 100.0, 100.0));

    let (seen, callback) = collect();
    let subscription = registry.observe(TargetId(1), &config(vec![0.0, 0.5, 1.0]), false, callback);

    // Nothing fires from observe itself; the initial read lands on the
    // first sweep.
    assert!(seen.borrow().is_empty());
    backend.poll(0.0);
    assert_eq!(seen.borrow().len(), 1);
    assert!(!seen.borrow()[0].entry.is_intersecting);

    // Quiescent sweep: no new entry.
    backend.poll(16.0);
    assert_eq!(seen.borrow().len(), 1);

    // Scrolling the target halfway in crosses 0.5.
    host.set_scroll(0.0, 150.0);
    backend.poll(32.0);
    assert_eq!(seen.borrow().len(), 2);
    {
        let entries = seen.borrow();
        let entry = &entries[1].entry;
        assert!(entry.is_intersecting);
        assert!((entry.intersection_ratio - 0.5).abs() < 1e-6);
    }

    // Re-arming forces a ground-truth entry with no state change at all.
    subscription.refresh();
    backend.poll(48.0);
    assert_eq!(seen.borrow().len(), 3);
}

#[test]
fn torn_down_target_is_silently_skipped() {
    use crate::fallback::FallbackBackend;
    use scrollscope_core::ViewportHost;

    let host = Rc::new(TestViewportHost::new(VIEWPORT));
    let backend = Rc::new(FallbackBackend::new(
        Rc::clone(&host) as Rc<dyn ViewportHost>
    ));
    let registry =
        ObservationRegistry::new(Rc::clone(&backend) as Rc<dyn IntersectionBackend>);
    host.place_target(TargetId(1), Rect::new(0.0, 100.0, 100.0, 100.0));

    let (seen, callback) = collect();
    let subscription = registry.observe(TargetId(1), &config(vec![0.0, 1.0]), false, callback);
    backend.poll(0.0);
    assert_eq!(seen.borrow().len(), 1);

    // The host tore the target down between scheduling and firing.
    host.remove_target(TargetId(1));
    backend.poll(16.0);
    assert_eq!(seen.borrow().len(), 1);
    assert!(subscription.is_active());
}
