pub mod audio_context;
pub mod canvas;
pub mod encoder;
pub mod host;
pub mod playback;
pub mod recording_delegate;
