use thiserror::Error;

/// Errors raised by the core simulation components.
///
/// I/O failures are surfaced through `anyhow` at the entry layer; these
/// variants cover the conditions the algorithms themselves must reject.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("invalid rotation axis '{0}', expected one of x, y, z")]
    InvalidAxis(String),

    #[error("shape mismatch: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    #[error("no foreground voxels above zero intensity")]
    EmptyForeground,

    #[error("volume maximum intensity is zero, cannot normalize")]
    ZeroIntensity,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
