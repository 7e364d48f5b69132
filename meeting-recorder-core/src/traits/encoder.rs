use std::sync::Arc;
use std::time::Duration;

use crate::models::error::RecorderError;
use crate::processing::chunk_buffer::EncodedChunk;

/// Callback invoked whenever the encoder flushes encoded data.
///
/// Fires on the encoder's own thread, in emission order.
pub type ChunkCallback = Arc<dyn Fn(EncodedChunk) + Send + Sync + 'static>;

/// Parameters the session opens an encoder with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOptions {
    pub mime_type: String,
    pub video_bits_per_second: u32,
    pub audio_bits_per_second: Option<u32>,
    pub frame_rate: u32,
}

/// Continuous encoder over a combined video + audio stream.
///
/// Equivalent to a `MediaRecorder`.
pub trait MediaEncoder: Send {
    fn mime_type(&self) -> &str;

    /// Start encoding, flushing a chunk through the callback every `timeslice`.
    fn start(&mut self, timeslice: Duration) -> Result<(), RecorderError>;

    /// Finalize. Every remaining chunk must have been delivered through the
    /// callback before this returns. Later calls are no-ops.
    fn stop(&mut self) -> Result<(), RecorderError>;
}
