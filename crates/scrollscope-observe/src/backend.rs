//! Capability probe and backend selection.

use std::rc::Rc;

use scrollscope_core::{IntersectionBackend, ViewportHost};

use crate::fallback::FallbackBackend;

/// The observation backend chosen once at startup.
///
/// Probing happens exactly once; the rest of the engine sees only the
/// [`IntersectionBackend`] trait, never a conditional branch per call.
pub enum Backend {
    /// The platform's own intersection primitive.
    Primitive(Rc<dyn IntersectionBackend>),
    /// Scroll-driven polling re-implementation of the same contract.
    Fallback(Rc<FallbackBackend>),
}

impl Backend {
    /// Selects the primitive when the platform provides one, otherwise
    /// degrades to the polling fallback. Never fails.
    pub fn probe(
        primitive: Option<Rc<dyn IntersectionBackend>>,
        host: Rc<dyn ViewportHost>,
    ) -> Self {
        match primitive {
            Some(backend) => Self::Primitive(backend),
            None => {
                log::warn!(
                    "intersection primitive unavailable; using scroll-driven polling fallback"
                );
                Self::Fallback(Rc::new(FallbackBackend::new(host)))
            }
        }
    }

    pub fn as_backend(&self) -> Rc<dyn IntersectionBackend> {
        match self {
            Self::Primitive(backend) => Rc::clone(backend),
            Self::Fallback(fallback) => Rc::clone(fallback) as Rc<dyn IntersectionBackend>,
        }
    }

    /// Forwards a scroll/resize tick to the fallback sweep. No-op on the
    /// primitive backend, which fires on its own.
    pub fn poll(&self, now_ms: f64) {
        if let Self::Fallback(fallback) = self {
            fallback.poll(now_ms);
        }
    }
}
