use std::any::Any;

use crate::models::error::RecorderError;

/// Decode progress of a playback, ordered like media element ready states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    /// A frame can be drawn once the current frame has been decoded.
    pub fn can_draw(self) -> bool {
        self >= Self::HaveCurrentData
    }
}

/// Hidden, muted playback of one stream's video, used as a draw source.
///
/// Equivalent to an offscreen `<video playsinline muted>` element.
pub trait VideoPlayback: Send {
    /// Begin playback. Must not block waiting for the first frame; readiness
    /// is observed later through `ready_state`.
    fn play(&mut self) -> Result<(), RecorderError>;

    fn ready_state(&self) -> ReadyState;

    /// Intrinsic size of the current frame, once known.
    fn video_size(&self) -> Option<(u32, u32)>;

    /// Stop decoding and unbind the stream.
    fn release(&mut self);

    fn as_any(&self) -> &dyn Any;
}
