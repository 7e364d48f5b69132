use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Kind of a live media track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// Host-specific backing of a track: a decoder, a sample feed, a canvas
/// capture. Hosts recover their own type with `MediaTrack::source_as`.
pub type TrackSource = Arc<dyn Any + Send + Sync>;

struct TrackInner {
    id: String,
    kind: TrackKind,
    label: String,
    source: TrackSource,
}

/// Handle to one live track.
///
/// Clones share identity. Two handles refer to the same track only when
/// they point at the same allocation; equal ids are not enough.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    pub fn new(
        id: impl Into<String>,
        kind: TrackKind,
        label: impl Into<String>,
        source: TrackSource,
    ) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: id.into(),
                kind,
                label: label.into(),
                source,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// The backing source, if it is a `T`.
    pub fn source_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner.source).downcast::<T>().ok()
    }

    pub fn same_track(&self, other: &MediaTrack) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address-based key for identity sets.
    pub fn identity_key(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("label", &self.inner.label)
            .finish()
    }
}

struct StreamInner {
    id: String,
    tracks: Vec<MediaTrack>,
}

/// Handle to a live stream: an ordered group of tracks.
#[derive(Clone)]
pub struct MediaStream {
    inner: Arc<StreamInner>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>, tracks: Vec<MediaTrack>) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                id: id.into(),
                tracks,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.inner.tracks
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks_of(TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks_of(TrackKind::Video)
    }

    fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &MediaTrack> {
        self.inner.tracks.iter().filter(move |t| t.kind() == kind)
    }

    /// Reference identity, not structural equality.
    pub fn same_stream(&self, other: &MediaStream) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.inner.id)
            .field("tracks", &self.inner.tracks)
            .finish()
    }
}

/// Stable identity of a composited source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    Local,
    Screen,
    Remote(usize),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Screen => f.write_str("screen"),
            Self::Remote(index) => write!(f, "remote-{}", index),
        }
    }
}

/// The live streams a session records from.
#[derive(Debug, Clone, Default)]
pub struct SessionSources {
    pub local: Option<MediaStream>,
    pub screen: Option<MediaStream>,
    pub remotes: Vec<MediaStream>,
}

impl SessionSources {
    pub fn local(stream: MediaStream) -> Self {
        Self {
            local: Some(stream),
            ..Default::default()
        }
    }

    pub fn with_screen(mut self, stream: MediaStream) -> Self {
        self.screen = Some(stream);
        self
    }

    pub fn with_remote(mut self, stream: MediaStream) -> Self {
        self.remotes.push(stream);
        self
    }

    /// A recording needs a local or screen stream to anchor the primary slot.
    pub fn has_primary(&self) -> bool {
        self.local.is_some() || self.screen.is_some()
    }

    /// Sources in draw order: screen, local, then remotes in arrival order.
    pub fn active(&self) -> Vec<(SourceId, &MediaStream)> {
        let mut active = Vec::with_capacity(2 + self.remotes.len());
        if let Some(screen) = &self.screen {
            active.push((SourceId::Screen, screen));
        }
        if let Some(local) = &self.local {
            active.push((SourceId::Local, local));
        }
        active.extend(
            self.remotes
                .iter()
                .enumerate()
                .map(|(index, stream)| (SourceId::Remote(index), stream)),
        );
        active
    }

    /// Every supplied stream, in draw order.
    pub fn streams(&self) -> Vec<MediaStream> {
        self.active().into_iter().map(|(_, s)| s.clone()).collect()
    }
}
