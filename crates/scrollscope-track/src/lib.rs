//! Position tracking for Scrollscope: scroll-based estimation, the
//! calibrate/estimate/skip policy, throttled delivery, and the
//! [`PositionTracker`] facade tying them to the observation layer.

pub mod estimator;
mod scheduler;
mod throttle;
mod tracker;

pub use scheduler::{classify, SyncAction, SyncPhase, SyncScheduler, Visibility};
pub use throttle::{DeliverFn, Throttle};
pub use tracker::{PositionTracker, TrackHandle};
