use std::collections::HashSet;

use crate::models::error::RecorderError;
use crate::models::media::{MediaStream, MediaTrack};
use crate::traits::audio_context::AudioContext;
use crate::traits::host::MediaHost;

/// All audio tracks of a session routed into one mix destination.
///
/// The route set is fixed when the graph is built. Each distinct track
/// object is routed at most once, however many streams carry it.
pub struct AudioMixGraph {
    context: Box<dyn AudioContext>,
    routed: HashSet<usize>,
    // Held so routed identities stay unique for the graph's lifetime.
    routes: Vec<MediaTrack>,
    output: MediaTrack,
    closed: bool,
}

impl AudioMixGraph {
    /// Create a context owned by this graph and route every audio track of
    /// `streams` into it.
    pub fn build<H: MediaHost + ?Sized>(host: &H, streams: &[MediaStream]) -> Result<Self, RecorderError> {
        let context = host.create_audio_context()?;
        let output = context.output_track();
        let mut graph = Self {
            context,
            routed: HashSet::new(),
            routes: Vec::new(),
            output,
            closed: false,
        };

        for stream in streams {
            for track in stream.audio_tracks() {
                graph.route(track);
            }
        }

        log::debug!("Audio mix built with {} route(s)", graph.route_count());
        Ok(graph)
    }

    fn route(&mut self, track: &MediaTrack) {
        if self.routed.contains(&track.identity_key()) {
            log::debug!("Audio track {} already routed", track.id());
            return;
        }
        match self.context.connect(track) {
            Ok(()) => {
                self.routed.insert(track.identity_key());
                self.routes.push(track.clone());
            }
            Err(e) => log::warn!("Leaving audio track {} out of the mix: {}", track.id(), e),
        }
    }

    /// The single mixed output track.
    pub fn output_track(&self) -> MediaTrack {
        self.output.clone()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Ids of routed tracks, in routing order.
    pub fn routed_track_ids(&self) -> Vec<&str> {
        self.routes.iter().map(|t| t.id()).collect()
    }

    pub fn is_routed(&self, track: &MediaTrack) -> bool {
        self.routed.contains(&track.identity_key())
    }

    /// Tear the context down. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.context.close();
        log::debug!("Audio context closed");
    }
}

impl Drop for AudioMixGraph {
    fn drop(&mut self) {
        self.close();
    }
}
