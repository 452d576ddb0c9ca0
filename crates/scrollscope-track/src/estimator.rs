//! Scroll-based position estimation.
//!
//! Bridges the gaps between real observations: given the last known record
//! and fresh scroll offsets, algebraically derives the target's new
//! rectangle and intersection state without touching the intersection
//! source. First-order approximation — it assumes the target's document
//! position is unchanged and only the viewport moved; drift is bounded by
//! the calibration policy, not detected here.

use scrollscope_core::{PositionRecord, Rect, Size};

/// Estimates a new position record from scroll deltas. Pure and O(1).
pub fn estimate(
    last: &PositionRecord,
    scroll_x: f32,
    scroll_y: f32,
    now_ms: f64,
    viewport: Size,
) -> PositionRecord {
    let delta_x = scroll_x - last.scroll_x;
    let delta_y = scroll_y - last.scroll_y;
    let rect = last.rect.translate(-delta_x, -delta_y);

    let band = Rect::from_size(viewport);
    let is_intersecting = rect.overlaps_vertical_band(&band);
    let area = rect.area();
    let intersection_ratio = if area > 0.0 {
        (rect.intersection_area(&band) / area).clamp(0.0, 1.0)
    } else {
        0.0
    };

    PositionRecord {
        rect,
        intersection_ratio,
        is_intersecting,
        time_ms: now_ms,
        scroll_x,
        scroll_y,
        // A custom root scrolls with the viewport, so the target's position
        // relative to it is unchanged by a viewport-only move.
        relative_rect: last.relative_rect,
    }
}
