//! Fake intersection backend with instance and call counting.
//!
//! Unlike the polling fallback, a fake source fires for every watched
//! target on each [`FakeBackend::fire_all`], so tests control delivery
//! cadence exactly and can assert on pooling and re-observation counts.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use scrollscope_core::{
    EntrySink, IntersectionBackend, IntersectionEntry, IntersectionSource, ObserverConfig, Rect,
    TargetId, ViewportHost,
};

use crate::host::TestViewportHost;

#[derive(Default)]
struct FakeCounters {
    created: Cell<usize>,
    observe_calls: Cell<usize>,
}

pub struct FakeBackend {
    host: Rc<TestViewportHost>,
    counters: Rc<FakeCounters>,
    sources: RefCell<Vec<Weak<RefCell<FakeSource>>>>,
}

impl FakeBackend {
    pub fn new(host: Rc<TestViewportHost>) -> Self {
        Self {
            host,
            counters: Rc::new(FakeCounters::default()),
            sources: RefCell::new(Vec::new()),
        }
    }

    /// How many underlying sources have ever been constructed.
    pub fn instance_count(&self) -> usize {
        self.counters.created.get()
    }

    /// Total `observe` calls across all sources, including re-arms.
    pub fn observe_call_count(&self) -> usize {
        self.counters.observe_calls.get()
    }

    /// Fires an entry for every watched target of every live source, as the
    /// platform primitive would after a batch of layout changes.
    pub fn fire_all(&self, now_ms: f64) {
        let live: Vec<Rc<RefCell<FakeSource>>> = {
            let mut sources = self.sources.borrow_mut();
            sources.retain(|weak| weak.strong_count() > 0);
            sources.iter().filter_map(Weak::upgrade).collect()
        };
        for source in live {
            let (entries, sink) = {
                let source = source.borrow();
                (source.snapshot(now_ms), Rc::clone(&source.sink))
            };
            if !entries.is_empty() {
                sink(&entries);
            }
        }
    }
}

impl IntersectionBackend for FakeBackend {
    fn create(&self, config: &ObserverConfig, sink: EntrySink) -> Box<dyn IntersectionSource> {
        self.counters.created.set(self.counters.created.get() + 1);
        let source = Rc::new(RefCell::new(FakeSource {
            host: Rc::clone(&self.host),
            config: config.clone(),
            sink,
            watched: Vec::new(),
        }));
        self.sources.borrow_mut().push(Rc::downgrade(&source));
        Box::new(FakeHandle {
            inner: source,
            counters: Rc::clone(&self.counters),
        })
    }
}

struct FakeSource {
    host: Rc<TestViewportHost>,
    config: ObserverConfig,
    sink: EntrySink,
    watched: Vec<TargetId>,
}

impl FakeSource {
    fn snapshot(&self, now_ms: f64) -> Vec<IntersectionEntry> {
        let frame = self
            .config
            .root
            .and_then(|root| self.host.target_rect(root))
            .unwrap_or_else(|| Rect::from_size(self.host.viewport_size()))
            .expand(self.config.margin);
        self.watched
            .iter()
            .filter_map(|&target| {
                let rect = self.host.target_rect(target)?;
                let area = rect.area();
                let overlap = rect.intersection_area(&frame);
                let ratio = if area > 0.0 {
                    (overlap / area).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                Some(IntersectionEntry {
                    target,
                    bounding_rect: rect,
                    root_bounds: frame,
                    intersection_ratio: ratio,
                    is_intersecting: overlap > 0.0,
                    time_ms: now_ms,
                })
            })
            .collect()
    }
}

struct FakeHandle {
    inner: Rc<RefCell<FakeSource>>,
    counters: Rc<FakeCounters>,
}

impl IntersectionSource for FakeHandle {
    fn observe(&mut self, target: TargetId) {
        self.counters
            .observe_calls
            .set(self.counters.observe_calls.get() + 1);
        let mut source = self.inner.borrow_mut();
        if !source.watched.contains(&target) {
            source.watched.push(target);
        }
    }

    fn unobserve(&mut self, target: TargetId) {
        self.inner.borrow_mut().watched.retain(|&t| t != target);
    }

    fn disconnect(&mut self) {
        self.inner.borrow_mut().watched.clear();
    }
}
