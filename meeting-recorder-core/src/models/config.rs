use std::time::Duration;

use super::geometry::Rgba;

/// Configuration for a recording session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfiguration {
    /// Composited frame width in pixels (default: 1280).
    pub canvas_width: u32,

    /// Composited frame height in pixels (default: 720).
    pub canvas_height: u32,

    /// Compositor redraw and canvas capture rate (default: 30).
    pub frame_rate: u32,

    /// Target video bitrate handed to the encoder (default: 2.5 Mbit/s).
    pub video_bits_per_second: u32,

    /// Target audio bitrate, or None to let the encoder decide.
    pub audio_bits_per_second: Option<u32>,

    /// Interval at which the encoder flushes chunks (default: 1s).
    pub timeslice: Duration,

    /// Container/codec preferences, most preferred first.
    pub mime_preferences: Vec<String>,

    /// Colour every frame is cleared to before sources are drawn.
    pub background: Rgba,

    /// Stop compositing and accepting chunks after this many seconds
    /// (None = unlimited).
    pub max_duration_secs: Option<u64>,
}

const MAX_WIDTH: u32 = 7680;
const MAX_HEIGHT: u32 = 4320;

impl RecorderConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err("canvas dimensions must be non-zero".into());
        }
        if self.canvas_width % 2 != 0 || self.canvas_height % 2 != 0 {
            return Err(format!(
                "canvas dimensions must be even: {}x{}",
                self.canvas_width, self.canvas_height
            ));
        }
        if self.canvas_width > MAX_WIDTH || self.canvas_height > MAX_HEIGHT {
            return Err(format!(
                "canvas too large: {}x{}",
                self.canvas_width, self.canvas_height
            ));
        }
        if !(1..=120).contains(&self.frame_rate) {
            return Err(format!("unsupported frame rate: {}", self.frame_rate));
        }
        if self.video_bits_per_second == 0 {
            return Err("video bitrate must be positive".into());
        }
        if self.audio_bits_per_second == Some(0) {
            return Err("audio bitrate must be positive".into());
        }
        if self.timeslice < Duration::from_millis(10) {
            return Err(format!("timeslice too short: {:?}", self.timeslice));
        }
        if self.mime_preferences.is_empty() {
            return Err("no mime type preferences".into());
        }
        if self.max_duration_secs == Some(0) {
            return Err("max duration must be positive".into());
        }
        Ok(())
    }

    /// Duration of one compositor frame.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            canvas_width: 1280,
            canvas_height: 720,
            frame_rate: 30,
            video_bits_per_second: 2_500_000,
            audio_bits_per_second: None,
            timeslice: Duration::from_millis(1000),
            mime_preferences: vec![
                "video/webm;codecs=vp9,opus".into(),
                "video/webm;codecs=vp8,opus".into(),
                "video/webm".into(),
                "video/mp4".into(),
            ],
            background: Rgba::BLACK,
            max_duration_secs: None,
        }
    }
}
