//! In-memory fakes of the host traits for unit tests.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::error::RecorderError;
use crate::models::geometry::{Rect, Rgba};
use crate::models::media::{MediaStream, MediaTrack, TrackKind};
use crate::processing::chunk_buffer::EncodedChunk;
use crate::traits::audio_context::AudioContext;
use crate::traits::canvas::Canvas;
use crate::traits::encoder::{ChunkCallback, EncoderOptions, MediaEncoder};
use crate::traits::host::MediaHost;
use crate::traits::playback::{ReadyState, VideoPlayback};

pub const FAKE_MIME: &str = "video/webm;codecs=vp9,opus";

/// Controllable video feed backing a fake video track.
pub struct FakeVideo {
    pub state: Mutex<FakeVideoState>,
}

pub struct FakeVideoState {
    pub ready: ReadyState,
    pub size: Option<(u32, u32)>,
    pub fail_play: bool,
    pub fail_draw: bool,
}

impl FakeVideo {
    pub fn ready(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeVideoState {
                ready: ReadyState::HaveEnoughData,
                size: Some((width, height)),
                fail_play: false,
                fail_draw: false,
            }),
        })
    }

    pub fn never_ready() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeVideoState {
                ready: ReadyState::HaveNothing,
                size: None,
                fail_play: false,
                fail_draw: false,
            }),
        })
    }
}

pub struct Silence;

pub fn video_track(id: &str, feed: Arc<FakeVideo>) -> MediaTrack {
    MediaTrack::new(id, TrackKind::Video, id, feed)
}

pub fn audio_track(id: &str) -> MediaTrack {
    MediaTrack::new(id, TrackKind::Audio, id, Arc::new(Silence))
}

/// Stream with one ready 640x480 video track and one audio track.
pub fn av_stream(id: &str) -> MediaStream {
    MediaStream::new(
        id,
        vec![
            video_track(&format!("{}-video", id), FakeVideo::ready(640, 480)),
            audio_track(&format!("{}-audio", id)),
        ],
    )
}

pub fn stream_with_feed(id: &str, feed: Arc<FakeVideo>) -> MediaStream {
    MediaStream::new(
        id,
        vec![
            video_track(&format!("{}-video", id), feed),
            audio_track(&format!("{}-audio", id)),
        ],
    )
}

pub struct FakePlayback {
    pub stream_id: String,
    feed: Option<Arc<FakeVideo>>,
    log: Arc<Mutex<HostLog>>,
}

impl VideoPlayback for FakePlayback {
    fn play(&mut self) -> Result<(), RecorderError> {
        match &self.feed {
            Some(feed) if !feed.state.lock().fail_play => Ok(()),
            _ => Err(RecorderError::SourcePlayback {
                source_id: self.stream_id.clone(),
                reason: "autoplay blocked".into(),
            }),
        }
    }

    fn ready_state(&self) -> ReadyState {
        self.feed
            .as_ref()
            .map(|f| f.state.lock().ready)
            .unwrap_or(ReadyState::HaveNothing)
    }

    fn video_size(&self) -> Option<(u32, u32)> {
        self.feed.as_ref().and_then(|f| f.state.lock().size)
    }

    fn release(&mut self) {
        self.log.lock().playbacks_released += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Clear(Rgba),
    Draw { stream_id: String, source: Rect, destination: Rect },
    Present,
}

/// Everything the fake host was asked to do.
#[derive(Default)]
pub struct HostLog {
    pub canvases_created: usize,
    pub playbacks_created: usize,
    pub playbacks_released: usize,
    pub contexts_created: usize,
    pub contexts_closed: usize,
    pub routes: Vec<String>,
    pub encoders_created: usize,
    pub encoder_stops: usize,
    pub encoder_options: Option<EncoderOptions>,
    pub encoder_stream_tracks: Vec<TrackKind>,
    pub canvas_ops: Vec<CanvasOp>,
    pub callback: Option<ChunkCallback>,
}

pub struct FakeCanvas {
    width: u32,
    height: u32,
    log: Arc<Mutex<HostLog>>,
}

impl FakeCanvas {
    pub fn new(width: u32, height: u32, log: Arc<Mutex<HostLog>>) -> Self {
        Self { width, height, log }
    }
}

impl Canvas for FakeCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: Rgba) {
        self.log.lock().canvas_ops.push(CanvasOp::Clear(color));
    }

    fn draw_video(
        &mut self,
        video: &dyn VideoPlayback,
        source: Rect,
        destination: Rect,
    ) -> Result<(), RecorderError> {
        let playback = video
            .as_any()
            .downcast_ref::<FakePlayback>()
            .ok_or_else(|| RecorderError::Draw("foreign playback".into()))?;
        if let Some(feed) = &playback.feed {
            if feed.state.lock().fail_draw {
                return Err(RecorderError::Draw("decode error".into()));
            }
        }
        self.log.lock().canvas_ops.push(CanvasOp::Draw {
            stream_id: playback.stream_id.clone(),
            source,
            destination,
        });
        Ok(())
    }

    fn present(&mut self) {
        self.log.lock().canvas_ops.push(CanvasOp::Present);
    }

    fn capture_track(&mut self, _frame_rate: u32) -> Result<MediaTrack, RecorderError> {
        Ok(MediaTrack::new("canvas", TrackKind::Video, "canvas", Arc::new(Silence)))
    }
}

pub struct FakeAudioContext {
    output: MediaTrack,
    log: Arc<Mutex<HostLog>>,
    closed: bool,
}

impl AudioContext for FakeAudioContext {
    fn connect(&mut self, track: &MediaTrack) -> Result<(), RecorderError> {
        if track.label() == "broken" {
            return Err(RecorderError::AudioGraph("cannot decode track".into()));
        }
        self.log.lock().routes.push(track.id().to_string());
        Ok(())
    }

    fn output_track(&self) -> MediaTrack {
        self.output.clone()
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.log.lock().contexts_closed += 1;
        }
    }
}

/// Encoder that flushes only when told to, plus one final chunk on stop.
pub struct FakeEncoder {
    mime_type: String,
    on_chunk: ChunkCallback,
    final_chunk: Vec<u8>,
    fail_start: Arc<AtomicBool>,
    fail_stop: bool,
    stopped: bool,
    log: Arc<Mutex<HostLog>>,
}

impl MediaEncoder for FakeEncoder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn start(&mut self, _timeslice: Duration) -> Result<(), RecorderError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(RecorderError::Encoding("encoder refused to start".into()));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.log.lock().encoder_stops += 1;
        (self.on_chunk)(EncodedChunk::new(std::mem::take(&mut self.final_chunk), 0));
        if self.fail_stop {
            return Err(RecorderError::Encoding("muxer crashed".into()));
        }
        Ok(())
    }
}

pub struct FakeHost {
    pub log: Arc<Mutex<HostLog>>,
    pub supported: Vec<String>,
    pub fail_encoder: bool,
    /// Checked on every encoder start, so it can be flipped between sessions.
    pub fail_encoder_start: Arc<AtomicBool>,
    pub fail_encoder_stop: bool,
    pub final_chunk: Vec<u8>,
    /// Stream ids the host refuses to open a playback for.
    pub unplayable: Vec<String>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(HostLog::default())),
            supported: vec![FAKE_MIME.into()],
            fail_encoder: false,
            fail_encoder_start: Arc::new(AtomicBool::new(false)),
            fail_encoder_stop: false,
            final_chunk: Vec::new(),
            unplayable: Vec::new(),
        }
    }

    /// Simulate a timed encoder flush.
    pub fn flush(&self, data: &[u8]) {
        let callback = self.log.lock().callback.clone();
        if let Some(callback) = callback {
            callback(EncodedChunk::new(data.to_vec(), 0));
        }
    }

    pub fn draws(&self) -> Vec<String> {
        self.log
            .lock()
            .canvas_ops
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Draw { stream_id, .. } => Some(stream_id.clone()),
                _ => None,
            })
            .collect()
    }
}

impl MediaHost for FakeHost {
    fn create_playback(&self, stream: &MediaStream) -> Result<Box<dyn VideoPlayback>, RecorderError> {
        if self.unplayable.iter().any(|id| id == stream.id()) {
            return Err(RecorderError::SourcePlayback {
                source_id: stream.id().to_string(),
                reason: "unsupported format".into(),
            });
        }
        let feed = stream
            .video_tracks()
            .next()
            .and_then(|t| t.source_as::<FakeVideo>());
        self.log.lock().playbacks_created += 1;
        Ok(Box::new(FakePlayback {
            stream_id: stream.id().to_string(),
            feed,
            log: Arc::clone(&self.log),
        }))
    }

    fn create_canvas(&self, width: u32, height: u32) -> Result<Box<dyn Canvas>, RecorderError> {
        self.log.lock().canvases_created += 1;
        Ok(Box::new(FakeCanvas::new(width, height, Arc::clone(&self.log))))
    }

    fn create_audio_context(&self) -> Result<Box<dyn AudioContext>, RecorderError> {
        self.log.lock().contexts_created += 1;
        Ok(Box::new(FakeAudioContext {
            output: MediaTrack::new("mix", TrackKind::Audio, "mix", Arc::new(Silence)),
            log: Arc::clone(&self.log),
            closed: false,
        }))
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.supported.iter().any(|m| m == mime_type)
    }

    fn create_encoder(
        &self,
        stream: MediaStream,
        options: &EncoderOptions,
        on_chunk: ChunkCallback,
    ) -> Result<Box<dyn MediaEncoder>, RecorderError> {
        if self.fail_encoder {
            return Err(RecorderError::EncoderUnavailable("no hardware encoder".into()));
        }
        let mut log = self.log.lock();
        log.encoders_created += 1;
        log.encoder_options = Some(options.clone());
        log.encoder_stream_tracks = stream.tracks().iter().map(|t| t.kind()).collect();
        log.callback = Some(Arc::clone(&on_chunk));
        Ok(Box::new(FakeEncoder {
            mime_type: options.mime_type.clone(),
            on_chunk,
            final_chunk: self.final_chunk.clone(),
            fail_start: Arc::clone(&self.fail_encoder_start),
            fail_stop: self.fail_encoder_stop,
            stopped: false,
            log: Arc::clone(&self.log),
        }))
    }
}
