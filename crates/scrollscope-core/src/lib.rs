//! Core types and contracts for the Scrollscope tracking engine.
//!
//! This crate holds the pure data model — geometry, position records,
//! scroll direction, threshold planning — and the platform traits the
//! engine is wired against. It performs no observation itself.

mod config;
mod error;
mod geometry;
mod observer;
mod platform;
mod record;

pub mod threshold;

pub use config::{ThresholdSpec, TrackOptions, DEFAULT_CALIBRATE_INTERVAL_MS};
pub use error::ConfigError;
pub use geometry::{EdgeInsets, Point, Rect, Size};
pub use observer::{
    EntrySink, IntersectionBackend, IntersectionEntry, IntersectionSource, ObserverConfig,
};
pub use platform::{Clock, MonotonicClock, TargetId, TimerHost, TimerId, ViewportHost};
pub use record::{PositionRecord, ScrollDirection, DIRECTION_DEAD_ZONE};
