//! # meeting-recorder-soft
//!
//! Pure-software media host for meeting-recorder.
//!
//! Provides:
//! - `SyntheticVideo` / `SyntheticAudio`: in-memory feeds that stand in for cameras, screens and peers
//! - `SoftCanvas`: RGBA raster with nearest-neighbour scaling
//! - `SoftAudioContext`: summing mixer with per-feed resampling
//! - `SoftEncoder`: raw chunked encoder writing the `MRAW` container
//! - `SoftHost`: the `MediaHost` tying them together
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use meeting_recorder_core::{Rgba, MediaStream, RecordingSession, SessionSources};
//! use meeting_recorder_soft::{SoftHost, SyntheticVideo};
//!
//! let host = SoftHost::new();
//! let config = host.recommended_configuration();
//! let cam = SyntheticVideo::solid(640, 480, Rgba::opaque(0, 128, 0));
//! let mut session = RecordingSession::new(Arc::new(host), config);
//! session.start(SessionSources::local(MediaStream::new("cam", vec![cam.track("cam-video")])), "Standup")?;
//! let result = session.stop();
//! ```

pub mod audio_context;
pub mod audio_feed;
pub mod canvas;
pub mod encoder;
pub mod error;
pub mod mixer;
pub mod video;

pub use audio_context::{MixedAudio, SoftAudioContext};
pub use audio_feed::SyntheticAudio;
pub use canvas::{CanvasFeed, SoftCanvas};
pub use encoder::{bytes_per_second, parse_container, RawFrame, RawRecording, SoftEncoder, MIME_TYPE};
pub use error::SoftError;
pub use video::{SoftPlayback, SyntheticVideo};

use meeting_recorder_core::models::config::RecorderConfiguration;
use meeting_recorder_core::models::error::RecorderError;
use meeting_recorder_core::models::media::MediaStream;
use meeting_recorder_core::traits::audio_context::AudioContext;
use meeting_recorder_core::traits::canvas::Canvas;
use meeting_recorder_core::traits::encoder::{ChunkCallback, EncoderOptions, MediaEncoder};
use meeting_recorder_core::traits::host::MediaHost;
use meeting_recorder_core::traits::playback::VideoPlayback;

const DEFAULT_SAMPLE_RATE: u32 = 48_000;

// Raw RGBA at 256x144 and 10 fps buffers about 1.6 MB per second with audio,
// so the five minute cap keeps a session under 500 MB in memory.
const RECOMMENDED_WIDTH: u32 = 256;
const RECOMMENDED_HEIGHT: u32 = 144;
const RECOMMENDED_FRAME_RATE: u32 = 10;
const RECOMMENDED_MAX_DURATION_SECS: u64 = 300;

/// `MediaHost` backed entirely by in-process buffers.
#[derive(Debug, Clone, Copy)]
pub struct SoftHost {
    sample_rate: u32,
}

impl SoftHost {
    pub fn new() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    /// Host whose audio mix runs at `sample_rate`.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Configuration sized for uncompressed recording in memory.
    ///
    /// Every frame is kept as raw RGBA until `stop()`, so the whole session
    /// costs `buffered_bytes_per_second(config) * max_duration_secs` bytes.
    /// Raising the canvas size or frame rate should come with a shorter cap.
    pub fn recommended_configuration(&self) -> RecorderConfiguration {
        RecorderConfiguration {
            canvas_width: RECOMMENDED_WIDTH,
            canvas_height: RECOMMENDED_HEIGHT,
            frame_rate: RECOMMENDED_FRAME_RATE,
            mime_preferences: vec![MIME_TYPE.into()],
            max_duration_secs: Some(RECOMMENDED_MAX_DURATION_SECS),
            ..Default::default()
        }
    }

    /// Memory the recording buffer grows by per second under `config`.
    pub fn buffered_bytes_per_second(&self, config: &RecorderConfiguration) -> u64 {
        bytes_per_second(config.canvas_width, config.canvas_height, config.frame_rate, self.sample_rate)
    }
}

impl Default for SoftHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaHost for SoftHost {
    fn create_playback(&self, stream: &MediaStream) -> Result<Box<dyn VideoPlayback>, RecorderError> {
        Ok(Box::new(SoftPlayback::new(stream)))
    }

    fn create_canvas(&self, width: u32, height: u32) -> Result<Box<dyn Canvas>, RecorderError> {
        if width == 0 || height == 0 {
            return Err(RecorderError::ConfigurationFailed(format!(
                "cannot allocate a {}x{} canvas",
                width, height
            )));
        }
        Ok(Box::new(SoftCanvas::new(width, height)))
    }

    fn create_audio_context(&self) -> Result<Box<dyn AudioContext>, RecorderError> {
        if self.sample_rate == 0 {
            return Err(RecorderError::AudioGraph("sample rate must be positive".into()));
        }
        Ok(Box::new(SoftAudioContext::new(self.sample_rate)))
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        mime_type
            .split(';')
            .next()
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(MIME_TYPE))
    }

    fn create_encoder(
        &self,
        stream: MediaStream,
        options: &EncoderOptions,
        on_chunk: ChunkCallback,
    ) -> Result<Box<dyn MediaEncoder>, RecorderError> {
        if !self.is_type_supported(&options.mime_type) {
            return Err(RecorderError::EncoderUnavailable(format!(
                "{} is not supported",
                options.mime_type
            )));
        }
        Ok(Box::new(SoftEncoder::new(stream, options, on_chunk)?))
    }
}
