//! Raw frame encoder and the `MRAW` container it writes.
//!
//! Layout (little-endian):
//!
//! ```text
//! header:  "MRAW" | version u8 | width u32 | height u32 | fps u32 | sample_rate u32
//! record:  tag [u8; 4] | timecode_ms u64 | len u32 | payload
//!          "VFRM" payload = width * height RGBA bytes
//!          "AUDS" payload = mono PCM16 samples
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use meeting_recorder_core::models::error::RecorderError;
use meeting_recorder_core::models::media::MediaStream;
use meeting_recorder_core::processing::chunk_buffer::EncodedChunk;
use meeting_recorder_core::traits::encoder::{ChunkCallback, EncoderOptions, MediaEncoder};

use crate::audio_context::MixedAudio;
use crate::canvas::CanvasFeed;
use crate::error::SoftError;
use crate::mixer;

pub const MIME_TYPE: &str = "video/x-meeting-raw";

const MAGIC: &[u8; 4] = b"MRAW";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 21;
const VIDEO_TAG: &[u8; 4] = b"VFRM";
const AUDIO_TAG: &[u8; 4] = b"AUDS";
const RECORD_OVERHEAD: u64 = 16;

/// Samples the composited canvas and the audio mix at the frame rate.
pub struct SoftEncoder {
    canvas: Arc<CanvasFeed>,
    audio: Option<Arc<MixedAudio>>,
    frame_rate: u32,
    on_chunk: ChunkCallback,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SoftEncoder {
    pub fn new(stream: MediaStream, options: &EncoderOptions, on_chunk: ChunkCallback) -> Result<Self, RecorderError> {
        let canvas = stream
            .video_tracks()
            .find_map(|t| t.source_as::<CanvasFeed>())
            .ok_or_else(|| RecorderError::EncoderUnavailable("stream has no canvas capture track".into()))?;
        let audio = stream.audio_tracks().find_map(|t| t.source_as::<MixedAudio>());

        log::debug!(
            "Soft encoder: {}x{} @ {} fps, audio {}, requested {} bps",
            canvas.width(),
            canvas.height(),
            options.frame_rate,
            if audio.is_some() { "mixed" } else { "none" },
            options.video_bits_per_second
        );

        Ok(Self {
            canvas,
            audio,
            frame_rate: options.frame_rate.max(1),
            on_chunk,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        })
    }

    fn header(&self) -> Vec<u8> {
        let sample_rate = self.audio.as_ref().map_or(0, |a| a.sample_rate());
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&self.canvas.width().to_le_bytes());
        out.extend_from_slice(&self.canvas.height().to_le_bytes());
        out.extend_from_slice(&self.frame_rate.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out
    }
}

fn write_record(out: &mut Vec<u8>, tag: &[u8; 4], timecode_ms: u64, payload: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&timecode_ms.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

/// Container bytes produced per second of recording.
///
/// Frames are stored uncompressed, so this is dominated by
/// `width * height * 4 * frame_rate`. A `sample_rate` of 0 means no audio.
pub fn bytes_per_second(width: u32, height: u32, frame_rate: u32, sample_rate: u32) -> u64 {
    let fps = frame_rate.max(1) as u64;
    let video = fps * (width as u64 * height as u64 * 4 + RECORD_OVERHEAD);
    let audio = if sample_rate == 0 {
        0
    } else {
        fps * ((sample_rate as u64 / fps) * 2 + RECORD_OVERHEAD)
    };
    video + audio
}

impl MediaEncoder for SoftEncoder {
    fn mime_type(&self) -> &str {
        MIME_TYPE
    }

    fn start(&mut self, timeslice: Duration) -> Result<(), RecorderError> {
        if self.handle.is_some() {
            return Err(RecorderError::Encoding("encoder already started".into()));
        }
        self.running.store(true, Ordering::SeqCst);

        let flag = Arc::clone(&self.running);
        let canvas = Arc::clone(&self.canvas);
        let audio = self.audio.clone();
        let on_chunk = Arc::clone(&self.on_chunk);
        let frame_interval = Duration::from_secs_f64(1.0 / self.frame_rate as f64);
        let samples_per_frame = audio.as_ref().map_or(0, |a| (a.sample_rate() / self.frame_rate) as usize);
        let mut pending = self.header();

        let handle = thread::Builder::new()
            .name("soft-encoder".into())
            .spawn(move || {
                let started = Instant::now();
                let mut last_flush = started;

                while flag.load(Ordering::SeqCst) {
                    thread::sleep(frame_interval);
                    if !flag.load(Ordering::SeqCst) {
                        break;
                    }

                    let timecode = started.elapsed().as_millis() as u64;
                    write_record(&mut pending, VIDEO_TAG, timecode, &canvas.snapshot());
                    if let Some(mix) = &audio {
                        let pcm = mixer::to_pcm16(&mix.pull(samples_per_frame));
                        write_record(&mut pending, AUDIO_TAG, timecode, &pcm);
                    }

                    if last_flush.elapsed() >= timeslice {
                        on_chunk(EncodedChunk::new(std::mem::take(&mut pending), timecode));
                        last_flush = Instant::now();
                    }
                }

                if !pending.is_empty() {
                    on_chunk(EncodedChunk::new(pending, started.elapsed().as_millis() as u64));
                }
            })
            .expect("failed to spawn encoder thread");

        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| RecorderError::Encoding("encoder thread panicked".into()))?;
        }
        Ok(())
    }
}

impl Drop for SoftEncoder {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// One decoded `VFRM` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub timecode_ms: u64,
    pub pixels: Vec<u8>,
}

/// Decoded contents of an `MRAW` container.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecording {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub sample_rate: u32,
    pub frames: Vec<RawFrame>,
    pub audio: Vec<f32>,
}

impl RawRecording {
    pub fn last_frame(&self) -> Option<&RawFrame> {
        self.frames.last()
    }

    /// RGBA of pixel (x, y) in `frame`.
    pub fn pixel(&self, frame: &RawFrame, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        frame.pixels.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], SoftError> {
        let end = self.offset.checked_add(n).filter(|&e| e <= self.data.len());
        let Some(end) = end else {
            return Err(SoftError::Truncated { offset: self.offset });
        };
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn u32(&mut self) -> Result<u32, SoftError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, SoftError> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    fn done(&self) -> bool {
        self.offset >= self.data.len()
    }
}

/// Decode an assembled `MRAW` blob.
pub fn parse_container(data: &[u8]) -> Result<RawRecording, SoftError> {
    let mut reader = Reader { data, offset: 0 };

    if reader.take(4).map_err(|_| SoftError::BadMagic)? != MAGIC {
        return Err(SoftError::BadMagic);
    }
    let version = reader.take(1)?[0];
    if version != VERSION {
        return Err(SoftError::UnsupportedVersion(version));
    }

    let mut recording = RawRecording {
        width: reader.u32()?,
        height: reader.u32()?,
        frame_rate: reader.u32()?,
        sample_rate: reader.u32()?,
        frames: Vec::new(),
        audio: Vec::new(),
    };

    while !reader.done() {
        let tag = reader.take(4)?;
        let timecode_ms = reader.u64()?;
        let len = reader.u32()? as usize;
        let payload = reader.take(len)?;

        match tag {
            t if t == VIDEO_TAG => {
                let expected = recording.width as usize * recording.height as usize * 4;
                if payload.len() != expected {
                    return Err(SoftError::FrameSize {
                        expected,
                        actual: payload.len(),
                    });
                }
                recording.frames.push(RawFrame {
                    timecode_ms,
                    pixels: payload.to_vec(),
                });
            }
            t if t == AUDIO_TAG => recording.audio.extend(mixer::from_pcm16(payload)),
            other => return Err(SoftError::UnknownRecord(String::from_utf8_lossy(other).into_owned())),
        }
    }

    Ok(recording)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use parking_lot::Mutex;

    use meeting_recorder_core::models::geometry::Rgba;
    use meeting_recorder_core::traits::audio_context::AudioContext;
    use meeting_recorder_core::traits::canvas::Canvas;

    use super::*;
    use crate::audio_context::SoftAudioContext;
    use crate::audio_feed::SyntheticAudio;
    use crate::canvas::SoftCanvas;

    fn options(frame_rate: u32) -> EncoderOptions {
        EncoderOptions {
            mime_type: MIME_TYPE.into(),
            video_bits_per_second: 1_000_000,
            audio_bits_per_second: None,
            frame_rate,
        }
    }

    fn collector() -> (ChunkCallback, Arc<Mutex<Vec<EncodedChunk>>>) {
        let chunks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&chunks);
        (Arc::new(move |c: EncodedChunk| sink.lock().push(c)), chunks)
    }

    fn joined(chunks: &Mutex<Vec<EncodedChunk>>) -> Vec<u8> {
        chunks.lock().iter().flat_map(|c| c.data.clone()).collect()
    }

    #[test]
    fn stream_without_canvas_is_rejected() {
        let (cb, _) = collector();
        let err = SoftEncoder::new(MediaStream::new("x", Vec::new()), &options(30), cb).err();
        assert!(matches!(err, Some(RecorderError::EncoderUnavailable(_))));
    }

    #[test]
    fn immediate_stop_yields_header_only() {
        let mut canvas = SoftCanvas::new(4, 2);
        let stream = MediaStream::new("c", vec![canvas.capture_track(10).unwrap()]);
        let (cb, chunks) = collector();

        let mut encoder = SoftEncoder::new(stream, &options(10), cb).unwrap();
        encoder.start(Duration::from_millis(500)).unwrap();
        encoder.stop().unwrap();

        let rec = parse_container(&joined(&chunks)).unwrap();
        assert_eq!((rec.width, rec.height, rec.frame_rate, rec.sample_rate), (4, 2, 10, 0));
        assert!(rec.frames.len() <= 1);
        assert!(rec.audio.is_empty());
    }

    #[test]
    fn records_presented_frames_and_mixed_audio() {
        let mut canvas = SoftCanvas::new(2, 2);
        canvas.clear(Rgba::opaque(0, 255, 0));
        canvas.present();

        let mic = SyntheticAudio::new(8_000, 8_000);
        mic.push(&[0.25; 4_000]);
        let mut ctx = SoftAudioContext::new(8_000);
        ctx.connect(&mic.track("mic")).unwrap();

        let stream = MediaStream::new("c", vec![canvas.capture_track(20).unwrap(), ctx.output_track()]);
        let (cb, chunks) = collector();
        let mut encoder = SoftEncoder::new(stream, &options(20), cb).unwrap();

        encoder.start(Duration::from_millis(50)).unwrap();
        thread::sleep(Duration::from_millis(300));
        encoder.stop().unwrap();

        assert!(chunks.lock().len() >= 2);
        let rec = parse_container(&joined(&chunks)).unwrap();
        assert!(rec.frames.len() >= 3);
        let last = rec.last_frame().unwrap();
        assert_eq!(rec.pixel(last, 1, 1), Some([0, 255, 0, 255]));
        assert_eq!(rec.audio.len(), rec.frames.len() * 400);
        assert_relative_eq!(rec.audio[0], 0.25, epsilon = 1e-4);
    }

    #[test]
    fn start_twice_is_an_error() {
        let mut canvas = SoftCanvas::new(2, 2);
        let stream = MediaStream::new("c", vec![canvas.capture_track(30).unwrap()]);
        let (cb, _) = collector();
        let mut encoder = SoftEncoder::new(stream, &options(30), cb).unwrap();

        encoder.start(Duration::from_millis(100)).unwrap();
        assert!(matches!(
            encoder.start(Duration::from_millis(100)),
            Err(RecorderError::Encoding(_))
        ));
        encoder.stop().unwrap();
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert_eq!(parse_container(b"WEBM"), Err(SoftError::BadMagic));
        assert_eq!(parse_container(b"MR"), Err(SoftError::BadMagic));

        let mut data = MAGIC.to_vec();
        data.push(9);
        assert_eq!(parse_container(&data), Err(SoftError::UnsupportedVersion(9)));

        let mut data = MAGIC.to_vec();
        data.push(VERSION);
        data.extend_from_slice(&[0; 16]);
        data.extend_from_slice(b"JUNK");
        data.extend_from_slice(&0u64.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(parse_container(&data), Err(SoftError::UnknownRecord("JUNK".into())));

        data.truncate(HEADER_LEN + 6);
        assert_eq!(parse_container(&data), Err(SoftError::Truncated { offset: HEADER_LEN + 4 }));
    }

    #[test]
    fn per_second_cost_counts_frames_audio_and_record_headers() {
        assert_eq!(bytes_per_second(4, 2, 10, 0), 10 * (4 * 2 * 4 + 16));
        assert_eq!(bytes_per_second(4, 2, 10, 48_000), 480 + 10 * (4_800 * 2 + 16));
        assert_eq!(bytes_per_second(1280, 720, 30, 0), 30 * (1280 * 720 * 4 + 16));
    }
}
