//! Deterministic test host for the Scrollscope engine.
//!
//! Bundles a manually advanced clock, a timer queue that fires on demand, a
//! scripted viewport host, and a fake intersection backend with instance
//! counting. Everything runs synchronously under test control; no real time
//! or platform events are involved.

mod clock;
mod host;
mod observer;
mod timers;

pub use clock::TestClock;
pub use host::TestViewportHost;
pub use observer::FakeBackend;
pub use timers::TestTimerHost;
