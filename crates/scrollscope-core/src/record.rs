//! Position snapshots and scroll-direction derivation.

use crate::geometry::Rect;

/// Movement below this many pixels between two observations is treated as
/// sub-pixel jitter and reported as `ScrollDirection::None`.
pub const DIRECTION_DEAD_ZONE: f32 = 1.0;

/// The user's scroll action between two consecutive observations of the same
/// target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl ScrollDirection {
    /// Derives a direction from the target's current and previous
    /// viewport-space rectangles.
    ///
    /// The dominant axis wins: when the vertical delta is larger than the
    /// horizontal one, the result is `Up`/`Down`, otherwise `Left`/`Right`.
    /// Deltas within [`DIRECTION_DEAD_ZONE`] report `None`.
    pub fn between(current: &Rect, previous: &Rect) -> Self {
        let delta_y = current.y - previous.y;
        let delta_x = current.x - previous.x;

        if delta_y.abs() > delta_x.abs() {
            if delta_y > DIRECTION_DEAD_ZONE {
                Self::Down
            } else if delta_y < -DIRECTION_DEAD_ZONE {
                Self::Up
            } else {
                Self::None
            }
        } else if delta_x > DIRECTION_DEAD_ZONE {
            Self::Right
        } else if delta_x < -DIRECTION_DEAD_ZONE {
            Self::Left
        } else {
            Self::None
        }
    }
}

/// An immutable snapshot of a target's position relative to its intersection
/// frame.
///
/// Every publish produces a fresh record behind `Rc`, never a mutation of an
/// earlier one, so consumers may compare records by `Rc::ptr_eq` to detect
/// "no change".
#[derive(Clone, Debug, PartialEq)]
pub struct PositionRecord {
    /// Viewport-space bounding rectangle of the target.
    pub rect: Rect,
    /// Fraction of the target's area overlapping the frame, in `[0, 1]`.
    pub intersection_ratio: f32,
    pub is_intersecting: bool,
    /// Timestamp of the observation or estimate, in milliseconds.
    pub time_ms: f64,
    /// Document scroll offsets at the time of the snapshot.
    pub scroll_x: f32,
    pub scroll_y: f32,
    /// Bounding rectangle relative to a custom root's bounds, present only
    /// when the subscription named a root.
    pub relative_rect: Option<Rect>,
}
