//! # meeting-recorder-core
//!
//! Host-agnostic meeting recording core library.
//!
//! Composites a changing set of live video sources into one grid frame,
//! mixes every audio track into one track, and drives a continuous encoder
//! session that yields a single file on stop. Platform media primitives
//! (playback, canvas, audio context, encoder) are reached through the
//! `MediaHost` trait and plug into the generic `RecordingSession`.
//!
//! ## Architecture
//!
//! ```text
//! meeting-recorder-core (this crate)
//! ├── traits/       ← MediaHost, Canvas, VideoPlayback, AudioContext, MediaEncoder, RecordingDelegate
//! ├── models/       ← RecorderError, RecordingState, RecorderConfiguration, MediaStream, RecordingResult
//! ├── processing/   ← GridLayout, cover_fit, ChunkBuffer
//! └── session/      ← VideoSourceRegistry, FrameCompositor, AudioMixGraph, ElapsedTimer, RecordingSession
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use models::config::RecorderConfiguration;
pub use models::diagnostics::{CompositorDiagnostics, RecordingDiagnostics};
pub use models::error::RecorderError;
pub use models::geometry::{Rect, Rgba};
pub use models::media::{MediaStream, MediaTrack, SessionSources, SourceId, TrackKind, TrackSource};
pub use models::recording_result::{
    extension_for_mime, format_elapsed, suggested_file_name, RecordingBlob, RecordingMetadata, RecordingResult,
};
pub use models::state::RecordingState;
pub use processing::chunk_buffer::{ChunkBuffer, EncodedChunk};
pub use processing::layout::{cover_fit, GridLayout};
pub use session::audio_mix::AudioMixGraph;
pub use session::compositor::{CompositorLoop, FrameCompositor};
pub use session::recording::RecordingSession;
pub use session::registry::VideoSourceRegistry;
pub use traits::audio_context::AudioContext;
pub use traits::canvas::Canvas;
pub use traits::encoder::{ChunkCallback, EncoderOptions, MediaEncoder};
pub use traits::host::MediaHost;
pub use traits::playback::{ReadyState, VideoPlayback};
pub use traits::recording_delegate::RecordingDelegate;
