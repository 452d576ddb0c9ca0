//! Canonical observation keys.
//!
//! A key is the deduplication handle for pooled intersection sources: two
//! configurations that serialize identically share one source.

use std::fmt::Write as _;

use scrollscope_core::ObserverConfig;

/// Canonical serialization of an observation configuration.
///
/// Covers thresholds (three-decimal form, matching planner rounding),
/// margin, root, and the one-shot flag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObservationKey(String);

impl ObservationKey {
    pub fn canonical(config: &ObserverConfig, once: bool) -> Self {
        let mut out = String::with_capacity(64);
        out.push_str("t:");
        for (index, threshold) in config.thresholds.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            let _ = write!(out, "{threshold:.3}");
        }
        let margin = config.margin;
        let _ = write!(
            out,
            "|m:{:.1},{:.1},{:.1},{:.1}",
            margin.left, margin.top, margin.right, margin.bottom
        );
        match config.root {
            Some(root) => {
                let _ = write!(out, "|r:{}", root.0);
            }
            None => out.push_str("|r:viewport"),
        }
        out.push_str(if once { "|once" } else { "|many" });
        Self(out)
    }
}

impl std::fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
