use crate::models::error::RecorderError;
use crate::models::geometry::{Rect, Rgba};
use crate::models::media::MediaTrack;
use crate::traits::playback::VideoPlayback;

/// Offscreen 2D drawing surface the compositor renders into.
///
/// Only the compositor loop touches the canvas while a session runs.
pub trait Canvas: Send {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Fill the whole surface with `color`.
    fn clear(&mut self, color: Rgba);

    /// Draw the `source` region of the playback's current frame, scaled into
    /// `destination` in canvas coordinates.
    fn draw_video(
        &mut self,
        video: &dyn VideoPlayback,
        source: Rect,
        destination: Rect,
    ) -> Result<(), RecorderError>;

    /// Called once a frame is complete. Hosts that sample the surface
    /// continuously can ignore it.
    fn present(&mut self) {}

    /// Live video track that follows the canvas contents at `frame_rate`.
    fn capture_track(&mut self, frame_rate: u32) -> Result<MediaTrack, RecorderError>;
}
