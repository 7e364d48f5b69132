//! Synthetic video feeds and the playback that reads them.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use meeting_recorder_core::models::error::RecorderError;
use meeting_recorder_core::models::geometry::Rgba;
use meeting_recorder_core::models::media::{MediaStream, MediaTrack, TrackKind};
use meeting_recorder_core::traits::playback::{ReadyState, VideoPlayback};

use crate::error::SoftError;

struct FrameState {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    ready: bool,
}

/// In-memory RGBA frame source standing in for a decoded camera, screen or
/// remote peer.
pub struct SyntheticVideo {
    frame: Mutex<FrameState>,
}

impl SyntheticVideo {
    /// A feed that already has a frame of solid `color`.
    pub fn solid(width: u32, height: u32, color: Rgba) -> Arc<Self> {
        Arc::new(Self {
            frame: Mutex::new(FrameState {
                width,
                height,
                pixels: solid_pixels(width, height, color),
                ready: true,
            }),
        })
    }

    /// A feed that has not decoded anything yet.
    pub fn pending(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            frame: Mutex::new(FrameState {
                width,
                height,
                pixels: solid_pixels(width, height, Rgba::BLACK),
                ready: false,
            }),
        })
    }

    pub fn set_ready(&self, ready: bool) {
        self.frame.lock().ready = ready;
    }

    pub fn is_ready(&self) -> bool {
        self.frame.lock().ready
    }

    pub fn fill(&self, color: Rgba) {
        let mut frame = self.frame.lock();
        frame.pixels = solid_pixels(frame.width, frame.height, color);
    }

    /// Replace the current frame; `pixels` is tightly packed RGBA.
    pub fn set_frame(&self, width: u32, height: u32, pixels: Vec<u8>) -> Result<(), SoftError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(SoftError::FrameSize {
                expected,
                actual: pixels.len(),
            });
        }
        let mut frame = self.frame.lock();
        frame.width = width;
        frame.height = height;
        frame.pixels = pixels;
        frame.ready = true;
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        let frame = self.frame.lock();
        (frame.width, frame.height)
    }

    /// Borrow the current frame as (width, height, pixels).
    pub(crate) fn with_frame<R>(&self, f: impl FnOnce(u32, u32, &[u8]) -> R) -> R {
        let frame = self.frame.lock();
        f(frame.width, frame.height, &frame.pixels)
    }

    /// Wrap the feed in a video track.
    pub fn track(self: &Arc<Self>, id: &str) -> MediaTrack {
        MediaTrack::new(id, TrackKind::Video, id, Arc::clone(self) as _)
    }
}

pub(crate) fn solid_pixels(width: u32, height: u32, color: Rgba) -> Vec<u8> {
    color.to_array().repeat(width as usize * height as usize)
}

/// Playback over the first video track of a stream.
pub struct SoftPlayback {
    stream_id: String,
    feed: Option<Arc<SyntheticVideo>>,
    playing: bool,
}

impl SoftPlayback {
    pub fn new(stream: &MediaStream) -> Self {
        Self {
            stream_id: stream.id().to_string(),
            feed: stream
                .video_tracks()
                .next()
                .and_then(|t| t.source_as::<SyntheticVideo>()),
            playing: false,
        }
    }

    pub(crate) fn feed(&self) -> Option<&Arc<SyntheticVideo>> {
        if self.playing {
            self.feed.as_ref()
        } else {
            None
        }
    }
}

impl VideoPlayback for SoftPlayback {
    fn play(&mut self) -> Result<(), RecorderError> {
        if self.feed.is_none() {
            return Err(RecorderError::SourcePlayback {
                source_id: self.stream_id.clone(),
                reason: "stream has no playable video track".into(),
            });
        }
        self.playing = true;
        Ok(())
    }

    fn ready_state(&self) -> ReadyState {
        match self.feed() {
            Some(feed) if feed.is_ready() => ReadyState::HaveEnoughData,
            Some(_) => ReadyState::HaveMetadata,
            None => ReadyState::HaveNothing,
        }
    }

    fn video_size(&self) -> Option<(u32, u32)> {
        self.feed().filter(|f| f.is_ready()).map(|f| f.size())
    }

    fn release(&mut self) {
        self.playing = false;
        self.feed = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_is_ready_once_playing_a_ready_feed() {
        let feed = SyntheticVideo::solid(4, 2, Rgba::opaque(10, 20, 30));
        let stream = MediaStream::new("cam", vec![feed.track("cam-video")]);
        let mut playback = SoftPlayback::new(&stream);

        assert_eq!(playback.ready_state(), ReadyState::HaveNothing);
        playback.play().unwrap();
        assert_eq!(playback.ready_state(), ReadyState::HaveEnoughData);
        assert_eq!(playback.video_size(), Some((4, 2)));
    }

    #[test]
    fn pending_feed_has_metadata_only() {
        let feed = SyntheticVideo::pending(4, 2);
        let stream = MediaStream::new("peer", vec![feed.track("peer-video")]);
        let mut playback = SoftPlayback::new(&stream);
        playback.play().unwrap();

        assert!(!playback.ready_state().can_draw());
        assert_eq!(playback.video_size(), None);

        feed.set_ready(true);
        assert!(playback.ready_state().can_draw());
    }

    #[test]
    fn audio_only_stream_cannot_play() {
        let stream = MediaStream::new("phone", Vec::new());
        let mut playback = SoftPlayback::new(&stream);

        let err = playback.play().unwrap_err();
        assert!(matches!(err, RecorderError::SourcePlayback { .. }));
    }

    #[test]
    fn release_unbinds_the_feed() {
        let feed = SyntheticVideo::solid(2, 2, Rgba::BLACK);
        let stream = MediaStream::new("cam", vec![feed.track("v")]);
        let mut playback = SoftPlayback::new(&stream);
        playback.play().unwrap();

        playback.release();

        assert_eq!(playback.ready_state(), ReadyState::HaveNothing);
        assert_eq!(Arc::strong_count(&feed), 2); // test handle + track
    }

    #[test]
    fn set_frame_checks_length() {
        let feed = SyntheticVideo::pending(2, 2);
        assert_eq!(
            feed.set_frame(2, 2, vec![0; 3]),
            Err(SoftError::FrameSize { expected: 16, actual: 3 })
        );
        feed.set_frame(1, 1, vec![1, 2, 3, 4]).unwrap();
        assert!(feed.is_ready());
        assert_eq!(feed.size(), (1, 1));

        feed.fill(Rgba::opaque(9, 8, 7));
        feed.with_frame(|w, h, px| assert_eq!((w, h, px), (1, 1, &[9u8, 8, 7, 255][..])));
    }
}
