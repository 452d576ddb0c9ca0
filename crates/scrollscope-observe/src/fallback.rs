//! Polling fallback for platforms without an intersection primitive.
//!
//! Reproduces the primitive's output shape with rectangle arithmetic against
//! the viewport bounds, swept from scroll/resize ticks. Any consumer built
//! against registry output works unmodified against entries produced here.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use scrollscope_core::{
    EntrySink, IntersectionBackend, IntersectionEntry, IntersectionSource, ObserverConfig, Rect,
    TargetId, ViewportHost,
};
use smallvec::SmallVec;

/// Backend that fabricates polling sources.
///
/// The owner must feed scroll/resize ticks into [`FallbackBackend::poll`];
/// sources fire entries only from those sweeps, never from `observe`.
pub struct FallbackBackend {
    host: Rc<dyn ViewportHost>,
    sources: RefCell<Vec<Weak<RefCell<FallbackSource>>>>,
}

impl FallbackBackend {
    pub fn new(host: Rc<dyn ViewportHost>) -> Self {
        Self {
            host,
            sources: RefCell::new(Vec::new()),
        }
    }

    /// Sweeps every live source, firing batched entries for each target
    /// whose intersection state changed since the previous sweep.
    pub fn poll(&self, now_ms: f64) {
        let live: Vec<Rc<RefCell<FallbackSource>>> = {
            let mut sources = self.sources.borrow_mut();
            sources.retain(|weak| weak.strong_count() > 0);
            sources.iter().filter_map(Weak::upgrade).collect()
        };
        for source in live {
            // Compute the batch first, then release the borrow: the sink may
            // re-enter the source through unobserve.
            let batch = source.borrow_mut().sweep(now_ms);
            if batch.is_empty() {
                continue;
            }
            let sink = Rc::clone(&source.borrow().sink);
            sink(&batch);
        }
    }
}

impl IntersectionBackend for FallbackBackend {
    fn create(&self, config: &ObserverConfig, sink: EntrySink) -> Box<dyn IntersectionSource> {
        let source = Rc::new(RefCell::new(FallbackSource {
            host: Rc::clone(&self.host),
            config: config.clone(),
            sink,
            watched: FxHashMap::default(),
        }));
        self.sources.borrow_mut().push(Rc::downgrade(&source));
        Box::new(FallbackHandle { inner: source })
    }
}

struct WatchState {
    /// Set on (re-)observe; guarantees a ground-truth entry on the next
    /// sweep regardless of threshold crossings.
    pending_initial: bool,
    last_ratio: f32,
    last_intersecting: bool,
}

struct FallbackSource {
    host: Rc<dyn ViewportHost>,
    config: ObserverConfig,
    sink: EntrySink,
    watched: FxHashMap<TargetId, WatchState>,
}

impl FallbackSource {
    fn sweep(&mut self, now_ms: f64) -> SmallVec<[IntersectionEntry; 4]> {
        let frame = frame_bounds(self.host.as_ref(), &self.config);
        let mut batch = SmallVec::new();
        for (&target, state) in &mut self.watched {
            let Some(rect) = self.host.target_rect(target) else {
                continue;
            };
            let (ratio, intersecting) = measure(&rect, &frame);
            let fire = state.pending_initial
                || state.last_intersecting != intersecting
                || crosses_threshold(&self.config.thresholds, state.last_ratio, ratio);
            if !fire {
                continue;
            }
            state.pending_initial = false;
            state.last_ratio = ratio;
            state.last_intersecting = intersecting;
            batch.push(IntersectionEntry {
                target,
                bounding_rect: rect,
                root_bounds: frame,
                intersection_ratio: ratio,
                is_intersecting: intersecting,
                time_ms: now_ms,
            });
        }
        batch
    }
}

/// Delegating handle handed to the registry; the backend keeps a weak
/// reference for sweeping, so dropping the handle retires the source.
struct FallbackHandle {
    inner: Rc<RefCell<FallbackSource>>,
}

impl IntersectionSource for FallbackHandle {
    fn observe(&mut self, target: TargetId) {
        self.inner.borrow_mut().watched.insert(
            target,
            WatchState {
                pending_initial: true,
                last_ratio: 0.0,
                last_intersecting: false,
            },
        );
    }

    fn unobserve(&mut self, target: TargetId) {
        self.inner.borrow_mut().watched.remove(&target);
    }

    fn disconnect(&mut self) {
        self.inner.borrow_mut().watched.clear();
    }
}

/// Intersection frame for a source: custom root bounds when configured,
/// otherwise the viewport band, expanded by the margin.
fn frame_bounds(host: &dyn ViewportHost, config: &ObserverConfig) -> Rect {
    let base = config
        .root
        .and_then(|root| host.target_rect(root))
        .unwrap_or_else(|| Rect::from_size(host.viewport_size()));
    base.expand(config.margin)
}

fn measure(rect: &Rect, frame: &Rect) -> (f32, bool) {
    let area = rect.area();
    let overlap = rect.intersection_area(frame);
    let ratio = if area > 0.0 {
        (overlap / area).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (ratio, overlap > 0.0)
}

/// True when any threshold lies strictly above the lower and at or below the
/// higher of the two ratios, i.e. a sample point was crossed in either
/// direction.
fn crosses_threshold(thresholds: &[f32], last: f32, current: f32) -> bool {
    if last == current {
        return false;
    }
    let low = last.min(current);
    let high = last.max(current);
    thresholds
        .iter()
        .any(|&threshold| low < threshold && threshold <= high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_crossing_detects_both_directions() {
        let thresholds = [0.0, 0.5, 1.0];
        assert!(crosses_threshold(&thresholds, 0.2, 0.7));
        assert!(crosses_threshold(&thresholds, 0.7, 0.2));
        assert!(!crosses_threshold(&thresholds, 0.2, 0.4));
        assert!(!crosses_threshold(&thresholds, 0.3, 0.3));
    }

    #[test]
    fn measure_reports_ratio_and_overlap() {
        let frame = Rect::new(0.0, 0.0, 400.0, 600.0);
        let half_in = Rect::new(0.0, 550.0, 100.0, 100.0);
        let (ratio, intersecting) = measure(&half_in, &frame);
        assert!((ratio - 0.5).abs() < 1e-6);
        assert!(intersecting);

        let outside = Rect::new(0.0, 700.0, 100.0, 100.0);
        let (ratio, intersecting) = measure(&outside, &frame);
        assert_eq!(ratio, 0.0);
        assert!(!intersecting);
    }
}
