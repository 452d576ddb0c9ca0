//! Platform abstraction traits for the tracking engine.
//!
//! These traits let the engine delegate clocks, deferred timers, and
//! viewport geometry queries to the host environment, so the same engine
//! runs against a real platform or a scripted test host.

use crate::geometry::{Point, Rect, Size};

/// Opaque handle for a tracked element, allocated by the host when the
/// element is registered.
///
/// Targets are addressed by handle everywhere; the engine never attaches
/// identity to the element itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(pub u64);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Provides timing information for the engine.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary fixed origin.
    fn now_ms(&self) -> f64;
}

/// Monotonic wall clock backed by [`web_time::Instant`].
pub struct MonotonicClock {
    origin: web_time::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: web_time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Identifier of a scheduled deferred callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Schedules one-shot deferred callbacks on behalf of the engine.
///
/// Carries throttle trailing edges. All callbacks run on the single engine
/// thread; `cancel` is idempotent and ignores unknown or already-fired ids.
pub trait TimerHost {
    fn schedule(&self, delay_ms: f64, callback: Box<dyn FnOnce()>) -> TimerId;
    fn cancel(&self, id: TimerId);
}

/// Viewport and element geometry queries answered by the host.
pub trait ViewportHost {
    /// Current document scroll offsets.
    fn scroll_offset(&self) -> Point;

    /// Current viewport size.
    fn viewport_size(&self) -> Size;

    /// Viewport-space bounding rectangle of a target, `None` once the
    /// target has been torn down.
    fn target_rect(&self, target: TargetId) -> Option<Rect>;
}
