use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use meeting_recorder_core::models::error::RecorderError;
use meeting_recorder_core::models::media::{MediaTrack, TrackKind};
use meeting_recorder_core::traits::audio_context::AudioContext;

use crate::audio_feed::SyntheticAudio;
use crate::mixer;

/// Mix destination shared between the context and whoever reads its output.
pub struct MixedAudio {
    sample_rate: u32,
    routes: Mutex<Vec<Arc<SyntheticAudio>>>,
    closed: AtomicBool,
}

impl MixedAudio {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn route_count(&self) -> usize {
        self.routes.lock().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Pull `frames` samples of the mix at the output rate.
    ///
    /// Each route contributes what it has buffered; a closed mix is silent.
    pub fn pull(&self, frames: usize) -> Vec<f32> {
        if self.is_closed() {
            return vec![0.0; frames];
        }
        let inputs: Vec<Vec<f32>> = self
            .routes
            .lock()
            .iter()
            .map(|feed| {
                let wanted = frames as u64 * feed.sample_rate() as u64 / self.sample_rate.max(1) as u64;
                let raw = feed.pull(wanted as usize);
                mixer::resample_linear(&raw, feed.sample_rate(), self.sample_rate)
            })
            .collect();
        mixer::mix_sum(&inputs, frames)
    }
}

/// Audio context summing every connected `SyntheticAudio` feed.
pub struct SoftAudioContext {
    mix: Arc<MixedAudio>,
    output: MediaTrack,
}

impl SoftAudioContext {
    pub fn new(sample_rate: u32) -> Self {
        let mix = Arc::new(MixedAudio {
            sample_rate,
            routes: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        });
        let output = MediaTrack::new("mix-output", TrackKind::Audio, "mixed audio", Arc::clone(&mix) as _);
        Self { mix, output }
    }

    pub fn mix(&self) -> &Arc<MixedAudio> {
        &self.mix
    }
}

impl AudioContext for SoftAudioContext {
    fn connect(&mut self, track: &MediaTrack) -> Result<(), RecorderError> {
        if self.mix.is_closed() {
            return Err(RecorderError::AudioGraph("context is closed".into()));
        }
        let feed = track.source_as::<SyntheticAudio>().ok_or_else(|| {
            RecorderError::AudioGraph(format!("track {} has no sample feed", track.id()))
        })?;
        self.mix.routes.lock().push(feed);
        log::debug!("Connected {} to the soft mix", track.id());
        Ok(())
    }

    fn output_track(&self) -> MediaTrack {
        self.output.clone()
    }

    fn close(&mut self) {
        self.mix.closed.store(true, Ordering::SeqCst);
        self.mix.routes.lock().clear();
    }
}
