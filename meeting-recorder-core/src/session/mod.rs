pub mod audio_mix;
pub mod compositor;
pub mod elapsed;
pub mod recording;
pub mod registry;
