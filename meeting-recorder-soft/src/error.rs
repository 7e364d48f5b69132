use thiserror::Error;

/// Errors specific to the software host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SoftError {
    #[error("frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSize { expected: usize, actual: usize },

    #[error("not a raw meeting recording")]
    BadMagic,

    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u8),

    #[error("container truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("unknown record tag: {0}")]
    UnknownRecord(String),
}
