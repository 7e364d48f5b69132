use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use meeting_recorder_core::models::error::RecorderError;
use meeting_recorder_core::models::geometry::{Rect, Rgba};
use meeting_recorder_core::models::media::{MediaTrack, TrackKind};
use meeting_recorder_core::traits::canvas::Canvas;
use meeting_recorder_core::traits::playback::VideoPlayback;

use crate::video::{solid_pixels, SoftPlayback};

/// Last presented canvas frame, readable from the encoder thread.
pub struct CanvasFeed {
    width: u32,
    height: u32,
    frame: Mutex<Vec<u8>>,
    frame_rate: AtomicU32,
    presented: AtomicU64,
}

impl CanvasFeed {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate.load(Ordering::SeqCst)
    }

    /// Frames presented since the canvas was created.
    pub fn presented(&self) -> u64 {
        self.presented.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.frame.lock().clone()
    }
}

/// RGBA raster canvas with nearest-neighbour scaling.
pub struct SoftCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    feed: Arc<CanvasFeed>,
}

impl SoftCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = solid_pixels(width, height, Rgba::BLACK);
        let feed = Arc::new(CanvasFeed {
            width,
            height,
            frame: Mutex::new(pixels.clone()),
            frame_rate: AtomicU32::new(0),
            presented: AtomicU64::new(0),
        });
        Self {
            width,
            height,
            pixels,
            feed,
        }
    }

    pub fn feed(&self) -> &Arc<CanvasFeed> {
        &self.feed
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.pixels[i..i + 4];
        Some(Rgba {
            r: p[0],
            g: p[1],
            b: p[2],
            a: p[3],
        })
    }

    fn blit(&mut self, frame: (u32, u32, &[u8]), source: Rect, destination: Rect) {
        let (fw, fh, src) = frame;
        if fw == 0 || fh == 0 || destination.width <= 0.0 || destination.height <= 0.0 {
            return;
        }

        let x0 = destination.x.floor().max(0.0) as u32;
        let y0 = destination.y.floor().max(0.0) as u32;
        let x1 = (destination.right().ceil().max(0.0) as u32).min(self.width);
        let y1 = (destination.bottom().ceil().max(0.0) as u32).min(self.height);

        for y in y0..y1 {
            let cy = y as f64 + 0.5;
            if cy < destination.y || cy >= destination.bottom() {
                continue;
            }
            let v = (cy - destination.y) / destination.height;
            let sy = ((source.y + v * source.height).floor().max(0.0) as u32).min(fh - 1);

            for x in x0..x1 {
                let cx = x as f64 + 0.5;
                if cx < destination.x || cx >= destination.right() {
                    continue;
                }
                let u = (cx - destination.x) / destination.width;
                let sx = ((source.x + u * source.width).floor().max(0.0) as u32).min(fw - 1);

                let si = (sy as usize * fw as usize + sx as usize) * 4;
                let di = (y as usize * self.width as usize + x as usize) * 4;
                self.pixels[di..di + 4].copy_from_slice(&src[si..si + 4]);
            }
        }
    }
}

impl Canvas for SoftCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color.to_array());
        }
    }

    fn draw_video(&mut self, video: &dyn VideoPlayback, source: Rect, destination: Rect) -> Result<(), RecorderError> {
        let playback = video
            .as_any()
            .downcast_ref::<SoftPlayback>()
            .ok_or_else(|| RecorderError::Draw("playback does not belong to this host".into()))?;
        let feed = playback
            .feed()
            .ok_or_else(|| RecorderError::Draw("playback is not playing".into()))?;

        feed.with_frame(|w, h, pixels| self.blit((w, h, pixels), source, destination));
        Ok(())
    }

    fn present(&mut self) {
        self.feed.frame.lock().copy_from_slice(&self.pixels);
        self.feed.presented.fetch_add(1, Ordering::SeqCst);
    }

    fn capture_track(&mut self, frame_rate: u32) -> Result<MediaTrack, RecorderError> {
        self.feed.frame_rate.store(frame_rate, Ordering::SeqCst);
        Ok(MediaTrack::new(
            "canvas-capture",
            TrackKind::Video,
            "composited canvas",
            Arc::clone(&self.feed) as _,
        ))
    }
}
