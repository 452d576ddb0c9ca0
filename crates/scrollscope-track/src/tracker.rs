//! The tracking facade.
//!
//! Wires one registry subscription, one sync scheduler, and one throttle
//! gate per tracked target. Ground-truth entries from the observation layer
//! and scroll-driven estimates funnel through the same gate, so consumers
//! see a single ordered stream of position records.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use scrollscope_core::{
    ConfigError, ObserverConfig, PositionRecord, TargetId, TimerHost, TrackOptions, ViewportHost,
    threshold,
};
use scrollscope_observe::{Backend, EntryCallback, ObservationRegistry, Subscription, TrackedEntry};

use crate::estimator;
use crate::scheduler::{SyncAction, SyncScheduler};
use crate::throttle::Throttle;

/// Tracks targets' positions relative to the viewport.
///
/// One tracker per application root; at most one active track per target,
/// tracking a target again replaces the previous subscription.
pub struct PositionTracker {
    shared: Rc<TrackerShared>,
}

struct TrackerShared {
    registry: ObservationRegistry,
    backend: Backend,
    host: Rc<dyn ViewportHost>,
    timers: Rc<dyn TimerHost>,
    tracked: RefCell<FxHashMap<TargetId, Rc<Tracked>>>,
}

struct Tracked {
    target: TargetId,
    options: TrackOptions,
    throttle: Throttle,
    scheduler: RefCell<SyncScheduler>,
    last_record: RefCell<Option<Rc<PositionRecord>>>,
    subscription: RefCell<Option<Subscription>>,
    /// Set once a one-shot completed or the handle was cancelled; late
    /// callbacks and ticks become no-ops.
    done: Cell<bool>,
}

impl PositionTracker {
    pub fn new(backend: Backend, host: Rc<dyn ViewportHost>, timers: Rc<dyn TimerHost>) -> Self {
        let registry = ObservationRegistry::new(backend.as_backend());
        Self {
            shared: Rc::new(TrackerShared {
                registry,
                backend,
                host,
                timers,
                tracked: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    /// Starts tracking a target.
    ///
    /// Fails fast on invalid configuration; every other condition degrades
    /// (see the error taxonomy in the crate docs). The consumer receives a
    /// fresh record per publish — compare with `Rc::ptr_eq` to detect
    /// "no change".
    pub fn track(
        &self,
        target: TargetId,
        options: TrackOptions,
        consumer: impl Fn(Rc<PositionRecord>) + 'static,
    ) -> Result<TrackHandle, ConfigError> {
        let thresholds = threshold::resolve(&options)?;
        let config = ObserverConfig {
            thresholds,
            margin: options.margin,
            root: options.root,
        };

        let throttle = Throttle::new(
            options.throttle_ms,
            Rc::clone(&self.shared.timers),
            Rc::new(consumer),
        );
        let tracked = Rc::new(Tracked {
            target,
            scheduler: RefCell::new(SyncScheduler::new(
                options.force_calibrate,
                options.calibrate_interval_ms,
            )),
            options,
            throttle,
            last_record: RefCell::new(None),
            subscription: RefCell::new(None),
            done: Cell::new(false),
        });

        let callback: EntryCallback = {
            let tracked = Rc::downgrade(&tracked);
            let host = Rc::clone(&self.shared.host);
            Rc::new(move |entry: &TrackedEntry| {
                if let Some(tracked) = tracked.upgrade() {
                    tracked.on_entry(entry, host.as_ref());
                }
            })
        };
        let subscription =
            self.shared
                .registry
                .observe(target, &config, tracked.options.once, callback);
        tracked.scheduler.borrow_mut().mark_pending();
        *tracked.subscription.borrow_mut() = Some(subscription);

        let replaced = self
            .shared
            .tracked
            .borrow_mut()
            .insert(target, Rc::clone(&tracked));
        if let Some(previous) = replaced {
            previous.teardown();
        }

        Ok(TrackHandle {
            shared: Rc::downgrade(&self.shared),
            tracked: Rc::downgrade(&tracked),
            target,
        })
    }

    /// Feeds a scroll tick through the fallback sweep (when active) and the
    /// per-target decision policy.
    pub fn on_scroll(&self, now_ms: f64) {
        self.shared.tick(now_ms, TickKind::Scroll);
    }

    /// Feeds a resize tick. The viewport band changed, so quiet targets are
    /// re-estimated even when partially visible.
    pub fn on_resize(&self, now_ms: f64) {
        self.shared.tick(now_ms, TickKind::Resize);
    }

    /// Tears down every subscription, pending timer, and pooled source.
    pub fn shutdown(&self) {
        let tracked: Vec<Rc<Tracked>> = self
            .shared
            .tracked
            .borrow_mut()
            .drain()
            .map(|(_, tracked)| tracked)
            .collect();
        for entry in tracked {
            entry.teardown();
        }
        self.shared.registry.disconnect();
    }

    /// Number of live pooled sources (one per distinct configuration).
    pub fn pool_count(&self) -> usize {
        self.shared.registry.pool_count()
    }
}

#[derive(Clone, Copy)]
enum TickKind {
    Scroll,
    Resize,
}

impl TrackerShared {
    fn tick(&self, now_ms: f64, kind: TickKind) {
        // Fallback sweep first: ground truth beats estimation on the same
        // tick, and a fresh entry resets the calibration deadline.
        self.backend.poll(now_ms);

        let tracked: Vec<Rc<Tracked>> = self.tracked.borrow().values().map(Rc::clone).collect();
        for entry in tracked {
            if entry.done.get() {
                continue;
            }
            let action = {
                let last = entry.last_record.borrow();
                let mut scheduler = entry.scheduler.borrow_mut();
                match kind {
                    TickKind::Scroll => scheduler.decide(last.as_deref(), now_ms),
                    TickKind::Resize => scheduler.decide_on_resize(last.as_deref(), now_ms),
                }
            };
            match action {
                SyncAction::Skip => {}
                SyncAction::Estimate => {
                    let last = entry.last_record.borrow().clone();
                    let Some(last) = last else {
                        continue;
                    };
                    let scroll = self.host.scroll_offset();
                    let record = Rc::new(estimator::estimate(
                        &last,
                        scroll.x,
                        scroll.y,
                        now_ms,
                        self.host.viewport_size(),
                    ));
                    *entry.last_record.borrow_mut() = Some(Rc::clone(&record));
                    entry.throttle.publish(record);
                }
                SyncAction::Calibrate => {
                    log::trace!("calibrating {}", entry.target);
                    if let Some(subscription) = entry.subscription.borrow().as_ref() {
                        subscription.refresh();
                    }
                }
            }
        }
    }
}

impl Tracked {
    fn on_entry(&self, tracked_entry: &TrackedEntry, host: &dyn ViewportHost) {
        if self.done.get() {
            return;
        }
        let entry = &tracked_entry.entry;
        let scroll = host.scroll_offset();
        // The entry's root_bounds carry the observation margin; the relative
        // rect is measured against the root element itself.
        let relative_rect = self.options.root.and_then(|root| {
            host.target_rect(root)
                .map(|bounds| entry.bounding_rect.translate(-bounds.x, -bounds.y))
        });
        let record = Rc::new(PositionRecord {
            rect: entry.bounding_rect,
            intersection_ratio: entry.intersection_ratio,
            is_intersecting: entry.is_intersecting,
            time_ms: entry.time_ms,
            scroll_x: scroll.x,
            scroll_y: scroll.y,
            relative_rect,
        });
        self.scheduler.borrow_mut().mark_calibrated(entry.time_ms);
        *self.last_record.borrow_mut() = Some(Rc::clone(&record));
        self.throttle.publish(record);

        // The registry auto-unobserved a one-shot; stop ticking but leave
        // the throttle alive so a trailing publish still lands.
        if self.options.once && entry.is_intersecting {
            self.done.set(true);
        }
    }

    fn teardown(&self) {
        self.done.set(true);
        if let Some(subscription) = self.subscription.borrow_mut().take() {
            subscription.cancel();
        }
        self.throttle.cancel();
        self.scheduler.borrow_mut().reset();
        *self.last_record.borrow_mut() = None;
    }
}

/// Handle to one tracked target.
///
/// Cancelling synchronously stops all future callbacks, clears any pending
/// trailing timer, and is safe to call repeatedly or after the tracker
/// itself was torn down. The handle also cancels on drop.
#[derive(Debug)]
pub struct TrackHandle {
    shared: Weak<TrackerShared>,
    tracked: Weak<Tracked>,
    target: TargetId,
}

impl TrackHandle {
    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.tracked
            .upgrade()
            .is_some_and(|tracked| !tracked.done.get())
    }

    pub fn cancel(&self) {
        let Some(tracked) = self.tracked.upgrade() else {
            return;
        };
        tracked.teardown();
        if let Some(shared) = self.shared.upgrade() {
            let mut map = shared.tracked.borrow_mut();
            let matches = map
                .get(&self.target)
                .is_some_and(|current| Rc::ptr_eq(current, &tracked));
            if matches {
                map.remove(&self.target);
            }
        }
    }
}

impl Drop for TrackHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "tests/tracker_tests.rs"]
mod tests;
