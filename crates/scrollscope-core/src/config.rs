//! Subscription configuration.

use crate::geometry::EdgeInsets;
use crate::platform::TargetId;

/// Default spacing between forced ground-truth reads while a target is
/// quiescent, in milliseconds.
pub const DEFAULT_CALIBRATE_INTERVAL_MS: f64 = 2000.0;

/// Explicit threshold sample points, a single value or a list.
#[derive(Clone, Debug, PartialEq)]
pub enum ThresholdSpec {
    Single(f32),
    Many(Vec<f32>),
}

/// Options for one tracked target.
///
/// `step` and `threshold` are mutually exclusive; when both are set the
/// explicit threshold wins (see [`crate::threshold::resolve`]).
#[derive(Clone, Debug, PartialEq)]
pub struct TrackOptions {
    /// Derive thresholds evenly spaced by this fraction of the target's area.
    pub step: Option<f32>,
    /// Use these exact sample points instead of a step.
    pub threshold: Option<ThresholdSpec>,
    /// Expands (or shrinks, when negative) the intersection frame before
    /// overlap is computed, in pixels.
    pub margin: EdgeInsets,
    /// Intersection frame; `None` means the viewport.
    pub root: Option<TargetId>,
    /// Auto-unsubscribe after the first intersecting event.
    pub once: bool,
    /// Periodically force a fresh ground-truth read while the target is
    /// fully visible or fully hidden.
    pub force_calibrate: bool,
    pub calibrate_interval_ms: f64,
    /// Minimum spacing between published records, in milliseconds. Zero
    /// publishes every update immediately.
    pub throttle_ms: f64,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            step: None,
            threshold: None,
            margin: EdgeInsets::default(),
            root: None,
            once: false,
            force_calibrate: false,
            calibrate_interval_ms: DEFAULT_CALIBRATE_INTERVAL_MS,
            throttle_ms: 0.0,
        }
    }
}

impl TrackOptions {
    pub fn with_step(mut self, step: f32) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_threshold(mut self, spec: ThresholdSpec) -> Self {
        self.threshold = Some(spec);
        self
    }

    pub fn with_margin(mut self, margin: EdgeInsets) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_root(mut self, root: TargetId) -> Self {
        self.root = Some(root);
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn with_force_calibrate(mut self, interval_ms: f64) -> Self {
        self.force_calibrate = true;
        self.calibrate_interval_ms = interval_ms;
        self
    }

    pub fn with_throttle(mut self, throttle_ms: f64) -> Self {
        self.throttle_ms = throttle_ms;
        self
    }
}
