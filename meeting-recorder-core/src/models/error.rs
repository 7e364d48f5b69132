use thiserror::Error;

/// Errors raised by the recording engine.
///
/// Only the start-time variants (`NoSource`, `EncoderUnavailable`,
/// `ConfigurationFailed`, `AudioGraph`) are ever returned to callers. The
/// per-source and per-frame variants are logged and absorbed so that a
/// running recording degrades to blank tiles instead of failing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("no local or screen stream to record")]
    NoSource,

    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),

    #[error("playback failed for {source_id}: {reason}")]
    SourcePlayback { source_id: String, reason: String },

    #[error("draw failed: {0}")]
    Draw(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("audio graph error: {0}")]
    AudioGraph(String),

    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("maximum recording duration of {limit_secs}s reached")]
    MaxDurationReached { limit_secs: u64 },
}
