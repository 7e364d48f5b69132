pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod media;
pub mod recording_result;
pub mod state;
