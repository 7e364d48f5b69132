use std::sync::Arc;

use parking_lot::Mutex;

use meeting_recorder_core::models::media::{MediaTrack, TrackKind};

#[derive(Debug)]
struct SampleRing {
    samples: Vec<f32>,
    start: usize,
    len: usize,
}

impl SampleRing {
    fn capacity(&self) -> usize {
        self.samples.len()
    }

    fn push(&mut self, input: &[f32]) {
        let cap = self.capacity();
        if cap == 0 || input.is_empty() {
            return;
        }
        let input = &input[input.len().saturating_sub(cap)..];

        let overflow = (self.len + input.len()).saturating_sub(cap);
        self.start = (self.start + overflow) % cap;
        self.len -= overflow;

        let mut end = (self.start + self.len) % cap;
        for &s in input {
            self.samples[end] = s;
            end = (end + 1) % cap;
        }
        self.len += input.len();
    }

    fn pull(&mut self, count: usize) -> Vec<f32> {
        let n = count.min(self.len);
        let cap = self.capacity();
        let out = (0..n).map(|i| self.samples[(self.start + i) % cap]).collect();
        if n > 0 {
            self.start = (self.start + n) % cap;
            self.len -= n;
        }
        out
    }
}

/// Mono f32 sample feed standing in for a microphone or a peer's audio.
///
/// Bounded: pushing past capacity discards the oldest samples.
#[derive(Debug)]
pub struct SyntheticAudio {
    sample_rate: u32,
    ring: Mutex<SampleRing>,
}

impl SyntheticAudio {
    pub fn new(sample_rate: u32, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            sample_rate,
            ring: Mutex::new(SampleRing {
                samples: vec![0.0; capacity],
                start: 0,
                len: 0,
            }),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn push(&self, samples: &[f32]) {
        self.ring.lock().push(samples);
    }

    /// Take up to `count` of the oldest buffered samples.
    pub fn pull(&self, count: usize) -> Vec<f32> {
        self.ring.lock().pull(count)
    }

    pub fn available(&self) -> usize {
        self.ring.lock().len
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    pub fn track(self: &Arc<Self>, id: &str) -> MediaTrack {
        MediaTrack::new(id, TrackKind::Audio, id, Arc::clone(self) as _)
    }
}
