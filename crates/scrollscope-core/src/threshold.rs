//! Threshold planning: turning a step size or explicit sample points into the
//! monotonic threshold array consumed by an intersection source.

use crate::config::{ThresholdSpec, TrackOptions};
use crate::error::ConfigError;

/// The default 11-point plan, `[0.0, 0.1, …, 1.0]`.
///
/// Chosen to balance sampling density against callback volume: dense enough
/// for smooth ratio ramps, sparse enough to keep dispatch cheap.
pub fn plan_default() -> Vec<f32> {
    (0..=10).map(|i| i as f32 / 10.0).collect()
}

/// Plans evenly spaced thresholds `0, step, 2·step, …, 1`, each rounded to
/// three decimals, with the endpoints forced to exactly `0.0` and `1.0`.
///
/// Fails with [`ConfigError::InvalidStep`] when `step` lies outside `(0, 1]`.
pub fn plan_from_step(step: f32) -> Result<Vec<f32>, ConfigError> {
    if !(step > 0.0 && step <= 1.0) {
        return Err(ConfigError::InvalidStep { step });
    }

    let count = (1.0 / step).ceil() as usize;
    let mut points: Vec<f32> = (0..count)
        .map(|i| round3(i as f32 * step).min(1.0))
        .collect();
    points.push(1.0);
    points[0] = 0.0;
    Ok(points)
}

/// Normalizes explicit sample points: clamped to `[0, 1]`, sorted ascending,
/// deduplicated.
pub fn plan_from_explicit(spec: &ThresholdSpec) -> Vec<f32> {
    let mut points: Vec<f32> = match spec {
        ThresholdSpec::Single(value) => vec![value.clamp(0.0, 1.0)],
        ThresholdSpec::Many(values) => {
            values.iter().map(|value| value.clamp(0.0, 1.0)).collect()
        }
    };
    points.sort_by(f32::total_cmp);
    points.dedup();
    points
}

/// Resolves the threshold plan for a subscription.
///
/// An explicit `threshold` wins over `step`; supplying both is legacy misuse
/// that must not crash callers, so the conflict only logs a warning. Neither
/// option selects the default plan.
pub fn resolve(options: &TrackOptions) -> Result<Vec<f32>, ConfigError> {
    match (&options.threshold, options.step) {
        (Some(spec), Some(step)) => {
            log::warn!(
                "both `threshold` and `step` supplied; using explicit threshold, ignoring step {step}"
            );
            Ok(plan_from_explicit(spec))
        }
        (Some(spec), None) => Ok(plan_from_explicit(spec)),
        (None, Some(step)) => plan_from_step(step),
        (None, None) => Ok(plan_default()),
    }
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}
