//! The intersection-source boundary.
//!
//! An [`IntersectionSource`] is the platform facility that asynchronously
//! reports when a target's visible overlap with a frame crosses a threshold.
//! The engine only ever talks to this trait; a real platform primitive and
//! the polling fallback are two implementations of the same contract,
//! selected once at startup by a capability probe.

use std::rc::Rc;

use crate::geometry::{EdgeInsets, Rect};
use crate::platform::TargetId;

/// Configuration for one pooled intersection source.
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverConfig {
    /// Monotonic sample points at which the source must fire.
    pub thresholds: Vec<f32>,
    /// Expansion of the intersection frame before overlap is computed.
    pub margin: EdgeInsets,
    /// Intersection frame; `None` means the viewport.
    pub root: Option<TargetId>,
}

/// One batched report from an intersection source.
#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionEntry {
    pub target: TargetId,
    /// Viewport-space bounding rectangle of the target.
    pub bounding_rect: Rect,
    /// Bounds of the intersection frame (viewport or custom root), margin
    /// applied.
    pub root_bounds: Rect,
    pub intersection_ratio: f32,
    pub is_intersecting: bool,
    pub time_ms: f64,
}

/// Receives batched entries from a source.
pub type EntrySink = Rc<dyn Fn(&[IntersectionEntry])>;

/// A live intersection source watching zero or more targets.
///
/// Implementations deliver entries from host event callbacks only — never
/// from within `observe`/`unobserve`/`disconnect`. The registry relies on
/// this to keep dispatch re-entrancy-safe.
pub trait IntersectionSource {
    /// Starts watching a target. Observing an already-watched target re-arms
    /// its initial report, which is how a forced calibration obtains a fresh
    /// ground-truth read.
    fn observe(&mut self, target: TargetId);

    /// Stops watching a target. Ignores targets that were never observed.
    fn unobserve(&mut self, target: TargetId);

    /// Stops watching every target and releases platform resources.
    fn disconnect(&mut self);
}

/// Constructs intersection sources for the registry.
///
/// The capability probe hands the engine `Some(backend)` when the platform
/// primitive exists and `None` otherwise; the engine then degrades to the
/// polling fallback without surfacing an error.
pub trait IntersectionBackend {
    fn create(&self, config: &ObserverConfig, sink: EntrySink) -> Box<dyn IntersectionSource>;
}
