use crate::transport::connection::{ConnectionState, IceGatheringState};
use pairline_core::{ParticipantId, RemoteTrack};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// Local description no longer matches the attached tracks.
    NegotiationNeeded,
    RemoteTrack { stream_id: String, track: RemoteTrack },
    IceGatheringChanged(IceGatheringState),
    StateChanged(ConnectionState),
}

/// Connection event tagged with the session and connection incarnation
/// that produced it.
#[derive(Debug, Clone)]
pub struct TransportEvent {
    pub remote: ParticipantId,
    pub generation: u64,
    pub event: ConnectionEvent,
}

/// Where a native connection pushes its events.
#[derive(Debug, Clone)]
pub struct EventSink {
    remote: ParticipantId,
    generation: u64,
    tx: mpsc::Sender<TransportEvent>,
}

impl EventSink {
    pub fn new(remote: ParticipantId, generation: u64, tx: mpsc::Sender<TransportEvent>) -> Self {
        Self {
            remote,
            generation,
            tx,
        }
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.remote
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn wrap(&self, event: ConnectionEvent) -> TransportEvent {
        TransportEvent {
            remote: self.remote.clone(),
            generation: self.generation,
            event,
        }
    }

    pub async fn send(&self, event: ConnectionEvent) {
        if self.tx.send(self.wrap(event)).await.is_err() {
            debug!("Coordinator gone, dropping event for {}", self.remote);
        }
    }

    /// Non-blocking variant for callers that run inside the coordinator.
    pub fn notify(&self, event: ConnectionEvent) {
        if let Err(e) = self.tx.try_send(self.wrap(event)) {
            warn!("Dropping connection event for {}: {}", self.remote, e);
        }
    }
}
