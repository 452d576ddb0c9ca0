//! The calibrate/estimate/skip decision policy.
//!
//! Partial visibility is already densely sampled by the source's threshold
//! crossings, so scroll ticks are skipped there. Fully visible and fully
//! hidden are quiet states for the source — no further crossings will occur
//! even though the target keeps moving on screen — so scroll-driven
//! estimation fills the gap, and a periodic forced calibration bounds the
//! drift that repeated first-order estimation would accumulate.

use scrollscope_core::PositionRecord;

/// Ratios are quantized to three decimals by the threshold planner, so
/// "fully visible" tolerates the same rounding.
const FULL_RATIO_EPSILON: f32 = 1e-3;

/// Visibility state implied by the last position record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    PartiallyVisible,
    FullyVisible,
    FullyHidden,
}

pub fn classify(record: &PositionRecord) -> Visibility {
    if !record.is_intersecting {
        Visibility::FullyHidden
    } else if record.intersection_ratio >= 1.0 - FULL_RATIO_EPSILON {
        Visibility::FullyVisible
    } else {
        Visibility::PartiallyVisible
    }
}

/// What to do on a scroll/resize tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncAction {
    /// The source will fire soon anyway.
    Skip,
    /// Publish a cheap scroll-based estimate.
    Estimate,
    /// Re-arm the source for one fresh ground-truth read.
    Calibrate,
}

/// Per-target observation lifecycle.
///
/// Estimation is only legal once a ground-truth read has arrived; before
/// that the target is `Pending` (subscribed, nothing observed yet) or
/// `Unobserved` (torn down).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncPhase {
    Unobserved,
    Pending,
    Calibrated,
}

/// Decision policy for one tracked target.
pub struct SyncScheduler {
    phase: SyncPhase,
    force_calibrate: bool,
    calibrate_interval_ms: f64,
    last_calibration_ms: f64,
}

impl SyncScheduler {
    pub fn new(force_calibrate: bool, calibrate_interval_ms: f64) -> Self {
        Self {
            phase: SyncPhase::Unobserved,
            force_calibrate,
            calibrate_interval_ms,
            last_calibration_ms: 0.0,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// The target has been subscribed but no ground truth has arrived.
    pub fn mark_pending(&mut self) {
        self.phase = SyncPhase::Pending;
    }

    /// A ground-truth read arrived; estimation is legal again and the
    /// calibration deadline restarts.
    pub fn mark_calibrated(&mut self, now_ms: f64) {
        self.phase = SyncPhase::Calibrated;
        self.last_calibration_ms = now_ms;
    }

    pub fn reset(&mut self) {
        self.phase = SyncPhase::Unobserved;
    }

    /// Decision for a scroll tick.
    ///
    /// Returning [`SyncAction::Calibrate`] moves the phase back to
    /// `Pending`; further ticks skip until the fresh read arrives.
    pub fn decide(&mut self, last: Option<&PositionRecord>, now_ms: f64) -> SyncAction {
        if self.phase != SyncPhase::Calibrated {
            return SyncAction::Skip;
        }
        let Some(record) = last else {
            return SyncAction::Skip;
        };
        match classify(record) {
            Visibility::PartiallyVisible => SyncAction::Skip,
            Visibility::FullyVisible | Visibility::FullyHidden => {
                if self.calibration_due(now_ms) {
                    self.phase = SyncPhase::Pending;
                    SyncAction::Calibrate
                } else {
                    SyncAction::Estimate
                }
            }
        }
    }

    /// Decision for a resize tick. The viewport band itself changed, so even
    /// a partially visible target is re-estimated rather than skipped.
    pub fn decide_on_resize(&mut self, last: Option<&PositionRecord>, now_ms: f64) -> SyncAction {
        if self.phase != SyncPhase::Calibrated || last.is_none() {
            return SyncAction::Skip;
        }
        if self.calibration_due(now_ms) {
            self.phase = SyncPhase::Pending;
            SyncAction::Calibrate
        } else {
            SyncAction::Estimate
        }
    }

    /// Soft deadline, checked opportunistically on ticks only: with no
    /// scrolling the calibration is deferred indefinitely.
    fn calibration_due(&self, now_ms: f64) -> bool {
        self.force_calibrate && now_ms - self.last_calibration_ms >= self.calibrate_interval_ms
    }
}
