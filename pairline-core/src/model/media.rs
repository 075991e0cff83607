use crate::error::MediaError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug)]
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    stopped: AtomicBool,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            debug!("Track {} ({:?}) stopped", self.id, self.kind);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Stream captured from the local camera and microphone.
///
/// Shared read-only between the proctoring loop and the peer session.
/// Only [`CapturedMedia`] stops its tracks.
#[derive(Debug)]
pub struct LocalStream {
    id: String,
    tracks: Vec<Arc<MediaTrack>>,
}

impl LocalStream {
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<MediaTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[Arc<MediaTrack>] {
        &self.tracks
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &Arc<MediaTrack>> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Video)
    }

    pub fn is_live(&self) -> bool {
        self.tracks.iter().any(|t| !t.is_stopped())
    }

    fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

/// Scoped owner of a captured stream. Dropping it stops every track.
#[derive(Debug)]
pub struct CapturedMedia {
    stream: Arc<LocalStream>,
}

impl CapturedMedia {
    pub fn new(stream: LocalStream) -> Self {
        Self {
            stream: Arc::new(stream),
        }
    }

    pub fn stream(&self) -> Arc<LocalStream> {
        self.stream.clone()
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for CapturedMedia {
    fn drop(&mut self) {
        debug!("Releasing local stream {}", self.stream.id());
        self.stream.stop_all();
    }
}

/// Capture device access (camera + microphone).
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<CapturedMedia, MediaError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStream {
    pub id: String,
    pub tracks: Vec<RemoteTrack>,
}
