use std::collections::HashMap;

use crate::models::media::{MediaStream, SourceId};
use crate::traits::host::MediaHost;
use crate::traits::playback::VideoPlayback;

struct BoundPlayback {
    stream: MediaStream,
    playback: Box<dyn VideoPlayback>,
}

/// One hidden playback per source identity.
///
/// A playback is rebuilt only when the stream bound to an identity is
/// replaced by a different stream object; handing the same stream again
/// returns the existing playback untouched. All playbacks live until
/// `release_all` at the end of the session.
#[derive(Default)]
pub struct VideoSourceRegistry {
    bound: HashMap<SourceId, BoundPlayback>,
    // Streams the host could not open, so they are not retried every frame.
    unavailable: HashMap<SourceId, MediaStream>,
    created: u64,
}

impl VideoSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Playback for `id`, creating or replacing it when `stream` is new.
    ///
    /// Returns None when the host cannot provide a playback for this
    /// stream; the source is then left blank.
    pub fn get_or_create<H: MediaHost + ?Sized>(
        &mut self,
        host: &H,
        id: SourceId,
        stream: &MediaStream,
    ) -> Option<&dyn VideoPlayback> {
        let current = self
            .bound
            .get(&id)
            .is_some_and(|b| b.stream.same_stream(stream));
        if !current {
            if self
                .unavailable
                .get(&id)
                .is_some_and(|s| s.same_stream(stream))
            {
                return None;
            }
            self.bind(host, id, stream);
        }
        self.bound.get(&id).map(|b| b.playback.as_ref())
    }

    fn bind<H: MediaHost + ?Sized>(&mut self, host: &H, id: SourceId, stream: &MediaStream) {
        if let Some(mut old) = self.bound.remove(&id) {
            log::debug!("Stream for {} changed, replacing playback", id);
            old.playback.release();
        }
        self.unavailable.remove(&id);

        let mut playback = match host.create_playback(stream) {
            Ok(playback) => playback,
            Err(e) => {
                log::warn!("No playback for {}: {}", id, e);
                self.unavailable.insert(id, stream.clone());
                return;
            }
        };

        // Best effort: a source that will not play just stays blank.
        if let Err(e) = playback.play() {
            log::warn!("Playback for {} did not start: {}", id, e);
        }

        log::debug!("Bound {} to stream {}", id, stream.id());
        self.created += 1;
        self.bound.insert(
            id,
            BoundPlayback {
                stream: stream.clone(),
                playback,
            },
        );
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.bound.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Total playbacks created, including replacements.
    pub fn created_count(&self) -> u64 {
        self.created
    }

    /// Unbind and release every playback.
    pub fn release_all(&mut self) {
        for (id, mut bound) in self.bound.drain() {
            log::debug!("Releasing playback for {}", id);
            bound.playback.release();
        }
        self.unavailable.clear();
    }
}

impl Drop for VideoSourceRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}
