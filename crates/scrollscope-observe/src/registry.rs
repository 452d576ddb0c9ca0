//! Pooled observation registry.
//!
//! The registry owns one intersection source per distinct observation key
//! and demultiplexes batched entries to per-target subscribers, enriching
//! each entry with the scroll direction derived from the previous
//! observation of the same target.
//!
//! It is an explicit service object: construct one per application root and
//! pass it by reference. There is no module-level singleton.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use scrollscope_core::{
    EntrySink, IntersectionBackend, IntersectionEntry, IntersectionSource, ObserverConfig, Rect,
    ScrollDirection, TargetId,
};

use crate::key::ObservationKey;

/// An intersection entry enriched with scroll direction and the previously
/// observed rectangle.
#[derive(Clone, Debug)]
pub struct TrackedEntry {
    pub entry: IntersectionEntry,
    pub scroll_direction: ScrollDirection,
    pub previous_rect: Option<Rect>,
}

/// Per-subscriber callback invoked for every enriched entry.
pub type EntryCallback = Rc<dyn Fn(&TrackedEntry)>;

struct Subscriber {
    callback: EntryCallback,
    once: bool,
    previous_rect: Option<Rect>,
    alive: Rc<Cell<bool>>,
}

/// One pooled source plus its subscribers and caches.
struct Pool {
    key: ObservationKey,
    source: RefCell<Option<Box<dyn IntersectionSource>>>,
    subscribers: RefCell<FxHashMap<TargetId, Subscriber>>,
}

impl Pool {
    fn with_source(&self, apply: impl FnOnce(&mut dyn IntersectionSource)) {
        if let Some(source) = self.source.borrow_mut().as_mut() {
            apply(source.as_mut());
        }
    }
}

/// Handle to one active subscription.
///
/// Cancelling is idempotent and safe after the registry itself has been
/// torn down; the handle also cancels on drop. Late entries for a cancelled
/// subscription are silently discarded via the shared liveness flag.
pub struct Subscription {
    shared: Weak<RegistryShared>,
    pool: Weak<Pool>,
    target: TargetId,
    alive: Rc<Cell<bool>>,
}

impl Subscription {
    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.alive.get()
    }

    /// Stops all future callbacks for this subscription and purges its
    /// cached state from the registry.
    pub fn cancel(&self) {
        if !self.alive.replace(false) {
            return;
        }
        if let (Some(shared), Some(pool)) = (self.shared.upgrade(), self.pool.upgrade()) {
            shared.remove_subscriber(&pool, self.target, Some(&self.alive));
        }
    }

    /// Re-arms the underlying source for this target, forcing a fresh
    /// ground-truth report on its next delivery. No-op once cancelled.
    pub fn refresh(&self) {
        if !self.alive.get() {
            return;
        }
        if let Some(pool) = self.pool.upgrade() {
            pool.with_source(|source| source.observe(self.target));
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Pools intersection sources by observation key and routes their entries.
pub struct ObservationRegistry {
    shared: Rc<RegistryShared>,
}

struct RegistryShared {
    backend: Rc<dyn IntersectionBackend>,
    pools: RefCell<FxHashMap<ObservationKey, Rc<Pool>>>,
}

impl ObservationRegistry {
    pub fn new(backend: Rc<dyn IntersectionBackend>) -> Self {
        Self {
            shared: Rc::new(RegistryShared {
                backend,
                pools: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    /// Subscribes a target under the given configuration.
    ///
    /// Configurations that serialize to the same key share one pooled
    /// source. At most one subscriber exists per (target, key); observing
    /// the same target again under the same key replaces the previous
    /// subscriber and deactivates its handle.
    pub fn observe(
        &self,
        target: TargetId,
        config: &ObserverConfig,
        once: bool,
        callback: EntryCallback,
    ) -> Subscription {
        let key = ObservationKey::canonical(config, once);
        let pool = self.shared.pool_for(&key, config);

        let alive = Rc::new(Cell::new(true));
        let replaced = pool.subscribers.borrow_mut().insert(
            target,
            Subscriber {
                callback,
                once,
                previous_rect: None,
                alive: Rc::clone(&alive),
            },
        );
        if let Some(previous) = replaced {
            previous.alive.set(false);
        }
        pool.with_source(|source| source.observe(target));

        log::trace!("observe {target} under key {key}");

        Subscription {
            shared: Rc::downgrade(&self.shared),
            pool: Rc::downgrade(&pool),
            target,
            alive,
        }
    }

    /// Tears down every pooled source and clears all subscriber state.
    ///
    /// Outstanding [`Subscription`] handles become inert no-ops.
    pub fn disconnect(&self) {
        let pools: Vec<Rc<Pool>> = self
            .shared
            .pools
            .borrow_mut()
            .drain()
            .map(|(_, pool)| pool)
            .collect();
        for pool in pools {
            for (_, subscriber) in pool.subscribers.borrow_mut().drain() {
                subscriber.alive.set(false);
            }
            if let Some(mut source) = pool.source.borrow_mut().take() {
                source.disconnect();
            }
        }
    }

    /// Number of live pooled sources. One per distinct observation key.
    pub fn pool_count(&self) -> usize {
        self.shared.pools.borrow().len()
    }
}

impl RegistryShared {
    fn pool_for(self: &Rc<Self>, key: &ObservationKey, config: &ObserverConfig) -> Rc<Pool> {
        if let Some(pool) = self.pools.borrow().get(key) {
            return Rc::clone(pool);
        }

        let pool = Rc::new(Pool {
            key: key.clone(),
            source: RefCell::new(None),
            subscribers: RefCell::new(FxHashMap::default()),
        });
        let sink: EntrySink = {
            let shared = Rc::downgrade(self);
            let weak_pool = Rc::downgrade(&pool);
            Rc::new(move |entries| {
                if let (Some(shared), Some(pool)) = (shared.upgrade(), weak_pool.upgrade()) {
                    shared.dispatch(&pool, entries);
                }
            })
        };
        let source = self.backend.create(config, sink);
        *pool.source.borrow_mut() = Some(source);
        self.pools.borrow_mut().insert(key.clone(), Rc::clone(&pool));
        pool
    }

    /// Routes a batch of entries to their subscribers.
    ///
    /// No registry borrow is held while a callback runs, so callbacks may
    /// freely cancel their own or other subscriptions.
    fn dispatch(self: &Rc<Self>, pool: &Rc<Pool>, entries: &[IntersectionEntry]) {
        for entry in entries {
            let parts = {
                let subscribers = pool.subscribers.borrow();
                subscribers.get(&entry.target).map(|subscriber| {
                    (
                        Rc::clone(&subscriber.callback),
                        subscriber.once,
                        Rc::clone(&subscriber.alive),
                        subscriber.previous_rect,
                    )
                })
            };
            let Some((callback, once, alive, previous_rect)) = parts else {
                continue;
            };
            if !alive.get() {
                continue;
            }

            let scroll_direction = previous_rect.map_or(ScrollDirection::None, |previous| {
                ScrollDirection::between(&entry.bounding_rect, &previous)
            });
            let tracked = TrackedEntry {
                entry: entry.clone(),
                scroll_direction,
                previous_rect,
            };
            callback(&tracked);

            // The callback may have cancelled or replaced the subscription.
            if let Some(subscriber) = pool.subscribers.borrow_mut().get_mut(&entry.target) {
                if Rc::ptr_eq(&subscriber.alive, &alive) {
                    subscriber.previous_rect = Some(entry.bounding_rect);
                }
            }

            if once && entry.is_intersecting {
                self.remove_subscriber(pool, entry.target, Some(&alive));
            }
        }
    }

    /// Removes one subscriber and, when it was the pool's last, disconnects
    /// and drops the pooled source.
    ///
    /// `expected` guards against a stale handle removing a newer subscriber
    /// registered for the same target.
    fn remove_subscriber(
        self: &Rc<Self>,
        pool: &Rc<Pool>,
        target: TargetId,
        expected: Option<&Rc<Cell<bool>>>,
    ) {
        let subscriber = {
            let mut subscribers = pool.subscribers.borrow_mut();
            let matches = subscribers.get(&target).is_some_and(|current| {
                expected.is_none_or(|flag| Rc::ptr_eq(&current.alive, flag))
            });
            if !matches {
                return;
            }
            subscribers.remove(&target)
        };
        let Some(subscriber) = subscriber else {
            return;
        };
        subscriber.alive.set(false);
        pool.with_source(|source| source.unobserve(target));

        let empty = pool.subscribers.borrow().is_empty();
        if empty {
            if let Some(mut source) = pool.source.borrow_mut().take() {
                source.disconnect();
            }
            self.pools.borrow_mut().remove(&pool.key);
            log::trace!("pool {} drained, source dropped", pool.key);
        }
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
