use crate::error::SessionError;
use crate::transport::{
    ConnectionFactory, EventSink, IceGatheringState, PeerConnection, TransportEvent,
};
use pairline_core::{
    LocalStream, ParticipantId, RemoteStream, RemoteTrack, SdpKind, SessionDescription,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// Connection incarnations are unique process-wide so events from a torn
// down session can never match a later one for the same remote.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    Idle,
    HaveLocalOffer,
    HaveRemoteOffer,
    Stable,
    Closed,
}

/// Negotiation state for one remote participant.
///
/// The native connection is created lazily and re-created whenever an
/// operation finds it missing or closed. Each incarnation gets a fresh
/// generation number that tags its [`TransportEvent`]s.
pub struct PeerSession {
    remote: ParticipantId,
    factory: Arc<dyn ConnectionFactory>,
    events: mpsc::Sender<TransportEvent>,
    connection: Option<Box<dyn PeerConnection>>,
    state: SignalingState,
    generation: u64,
    negotiated: bool,
    pending_negotiation: bool,
    local_stream: Option<Arc<LocalStream>>,
    remote_stream: Option<RemoteStream>,
    last_offer: Option<SessionDescription>,
    last_answer: Option<SessionDescription>,
    last_remote_offer: Option<SessionDescription>,
}

impl PeerSession {
    pub fn new(
        remote: ParticipantId,
        factory: Arc<dyn ConnectionFactory>,
        events: mpsc::Sender<TransportEvent>,
    ) -> Self {
        Self {
            remote,
            factory,
            events,
            connection: None,
            state: SignalingState::Idle,
            generation: 0,
            negotiated: false,
            pending_negotiation: false,
            local_stream: None,
            remote_stream: None,
            last_offer: None,
            last_answer: None,
            last_remote_offer: None,
        }
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.remote
    }

    pub fn state(&self) -> SignalingState {
        self.state
    }

    /// Generation of the live connection, `0` before the first one exists.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn local_stream(&self) -> Option<&Arc<LocalStream>> {
        self.local_stream.as_ref()
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    pub fn last_offer(&self) -> Option<&SessionDescription> {
        self.last_offer.as_ref()
    }

    pub fn last_answer(&self) -> Option<&SessionDescription> {
        self.last_answer.as_ref()
    }

    pub fn pending_negotiation(&self) -> bool {
        self.pending_negotiation
    }

    pub fn set_pending_negotiation(&mut self) {
        self.pending_negotiation = true;
    }

    pub fn take_pending_negotiation(&mut self) -> bool {
        std::mem::take(&mut self.pending_negotiation)
    }

    /// Whether `offer` is the remote offer this session already answered.
    pub fn has_answered(&self, offer: &SessionDescription) -> bool {
        self.state == SignalingState::Stable && self.last_remote_offer.as_ref() == Some(offer)
    }

    pub fn ice_gathering_complete(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|c| c.ice_gathering_state() == IceGatheringState::Complete)
    }

    /// Make sure a usable connection exists, replacing a closed one.
    pub async fn ensure_live(&mut self) -> Result<(), SessionError> {
        let healthy = self.state != SignalingState::Closed
            && self.connection.as_ref().is_some_and(|c| !c.is_closed());
        if healthy {
            return Ok(());
        }

        if let Some(stale) = self.connection.take()
            && let Err(e) = stale.close().await
        {
            debug!("Closing stale connection for {} failed: {:#}", self.remote, e);
        }

        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        let sink = EventSink::new(self.remote.clone(), generation, self.events.clone());
        let connection = self.factory.create(sink).await?;

        self.connection = Some(connection);
        self.generation = generation;
        self.state = SignalingState::Idle;
        self.negotiated = false;
        self.pending_negotiation = false;
        self.remote_stream = None;
        self.last_offer = None;
        self.last_answer = None;
        self.last_remote_offer = None;

        info!("Opened connection #{} for {}", generation, self.remote);
        Ok(())
    }

    fn live(&self) -> Result<&dyn PeerConnection, SessionError> {
        self.connection.as_deref().ok_or(SessionError::InvalidState {
            op: "use connection",
            state: self.state,
        })
    }

    pub async fn create_offer(&mut self) -> Result<SessionDescription, SessionError> {
        self.ensure_live().await?;
        if self.state == SignalingState::HaveRemoteOffer {
            return Err(SessionError::InvalidState {
                op: "create offer",
                state: self.state,
            });
        }

        let offer = self.live()?.create_offer().await?;
        self.state = SignalingState::HaveLocalOffer;
        self.last_offer = Some(offer.clone());
        debug!("Created offer for {}", self.remote);
        Ok(offer)
    }

    pub async fn create_answer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, SessionError> {
        if offer.kind != SdpKind::Offer {
            return Err(SessionError::WrongDescriptionKind {
                expected: SdpKind::Offer,
                got: offer.kind,
            });
        }
        self.ensure_live().await?;
        if self.state == SignalingState::HaveLocalOffer {
            return Err(SessionError::Glare);
        }

        let connection = self.live()?;
        connection.set_remote_description(offer.clone()).await?;
        self.state = SignalingState::HaveRemoteOffer;

        let answer = self.live()?.create_answer().await?;
        self.state = SignalingState::Stable;
        self.negotiated = true;
        self.last_remote_offer = Some(offer);
        self.last_answer = Some(answer.clone());
        debug!("Answered offer from {}", self.remote);
        Ok(answer)
    }

    pub async fn accept_remote_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<(), SessionError> {
        if answer.kind != SdpKind::Answer {
            return Err(SessionError::WrongDescriptionKind {
                expected: SdpKind::Answer,
                got: answer.kind,
            });
        }
        self.ensure_live().await?;
        if self.state != SignalingState::HaveLocalOffer {
            return Err(SessionError::UnexpectedAnswer(self.state));
        }

        self.live()?.set_remote_description(answer).await?;
        self.state = SignalingState::Stable;
        self.negotiated = true;
        debug!("Applied answer from {}", self.remote);
        Ok(())
    }

    /// Abandon a pending local offer. No-op in any other state.
    pub async fn rollback(&mut self) -> Result<(), SessionError> {
        if self.state != SignalingState::HaveLocalOffer {
            return Ok(());
        }

        self.live()?.rollback().await?;
        self.state = if self.negotiated {
            SignalingState::Stable
        } else {
            SignalingState::Idle
        };
        self.last_offer = None;
        info!("Rolled back local offer for {}", self.remote);
        Ok(())
    }

    /// Attach every live track of `stream` not already attached. Returns
    /// how many tracks were added.
    pub async fn add_local_tracks(
        &mut self,
        stream: Arc<LocalStream>,
    ) -> Result<usize, SessionError> {
        self.ensure_live().await?;
        let connection = self.live()?;

        let mut added = 0;
        for track in stream.tracks() {
            if track.is_stopped() || connection.has_track(track.id()) {
                continue;
            }
            connection.add_track(track, stream.id()).await?;
            added += 1;
        }

        if added > 0 {
            debug!("Attached {} local tracks for {}", added, self.remote);
        }
        self.local_stream = Some(stream);
        Ok(added)
    }

    /// Record a remote track. Tracks of the stream already held extend it,
    /// a different stream replaces it.
    pub fn set_remote_track(&mut self, stream_id: &str, track: RemoteTrack) -> &RemoteStream {
        let mut tracks = match self.remote_stream.take() {
            Some(current) if current.id == stream_id => current.tracks,
            _ => Vec::new(),
        };
        if !tracks.iter().any(|t| t.id == track.id) {
            tracks.push(track);
        }

        self.remote_stream.insert(RemoteStream {
            id: stream_id.to_owned(),
            tracks,
        })
    }

    pub fn set_remote_stream(&mut self, stream: RemoteStream) {
        self.remote_stream = Some(stream);
    }

    /// Close the connection and drop stream references. Idempotent.
    pub async fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.close().await {
                warn!("Error closing connection for {}: {:#}", self.remote, e);
            }
            info!("Closed connection #{} for {}", self.generation, self.remote);
        }
        self.state = SignalingState::Closed;
        self.pending_negotiation = false;
        self.local_stream = None;
        self.remote_stream = None;
    }
}
