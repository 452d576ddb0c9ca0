//! Observation layer for Scrollscope: source pooling, entry enrichment,
//! and the polling fallback.

mod backend;
mod fallback;
mod key;
mod registry;

pub use backend::Backend;
pub use fallback::FallbackBackend;
pub use key::ObservationKey;
pub use registry::{EntryCallback, ObservationRegistry, Subscription, TrackedEntry};
