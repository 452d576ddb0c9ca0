//! Caller-visible configuration failures.

/// Invalid tracking configuration supplied by the caller.
///
/// Raised eagerly at subscription time: a bad configuration is a programming
/// error, not a runtime condition, so it fails fast rather than degrading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// `step` must lie in `(0, 1]`.
    InvalidStep { step: f32 },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidStep { step } => {
                write!(f, "threshold step {step} outside (0, 1]")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
