use crate::models::error::RecorderError;
use crate::models::media::MediaStream;
use crate::traits::audio_context::AudioContext;
use crate::traits::canvas::Canvas;
use crate::traits::encoder::{ChunkCallback, EncoderOptions, MediaEncoder};
use crate::traits::playback::VideoPlayback;

/// Platform media capabilities the recorder is built on.
///
/// Implemented by:
/// - `SoftHost` (meeting-recorder-soft): in-memory raster canvas and raw encoder
pub trait MediaHost: Send + Sync + 'static {
    /// Create a hidden, muted playback bound to `stream`.
    fn create_playback(&self, stream: &MediaStream) -> Result<Box<dyn VideoPlayback>, RecorderError>;

    fn create_canvas(&self, width: u32, height: u32) -> Result<Box<dyn Canvas>, RecorderError>;

    fn create_audio_context(&self) -> Result<Box<dyn AudioContext>, RecorderError>;

    /// Whether an encoder can be opened for `mime_type`.
    fn is_type_supported(&self, mime_type: &str) -> bool;

    fn create_encoder(
        &self,
        stream: MediaStream,
        options: &EncoderOptions,
        on_chunk: ChunkCallback,
    ) -> Result<Box<dyn MediaEncoder>, RecorderError>;
}
