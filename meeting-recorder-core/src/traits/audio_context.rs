use crate::models::error::RecorderError;
use crate::models::media::MediaTrack;

/// Audio-processing graph with a single mix destination.
///
/// One context is owned per recording session and closed when it ends.
pub trait AudioContext: Send {
    /// Route `track` into the mix destination.
    fn connect(&mut self, track: &MediaTrack) -> Result<(), RecorderError>;

    /// The mix destination's output track. Stable for the context's lifetime.
    fn output_track(&self) -> MediaTrack;

    /// Disconnect every route and release the context.
    fn close(&mut self);
}
