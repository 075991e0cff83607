use crate::transport::transport_event::EventSink;
use anyhow::Result;
use async_trait::async_trait;
use pairline_core::{MediaTrack, SessionDescription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceGatheringState {
    New,
    Gathering,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Native peer connection as seen by a [`PeerSession`](crate::PeerSession).
///
/// Implementations report asynchronous happenings (renegotiation needed,
/// remote tracks, ICE progress) through the [`EventSink`] they were built
/// with, never by calling back into the session.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Create an offer and install it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Create an answer to the applied remote offer and install it locally.
    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    /// Drop a pending local offer, returning to the last stable state.
    async fn rollback(&self) -> Result<()>;

    async fn add_track(&self, track: &MediaTrack, stream_id: &str) -> Result<()>;

    fn has_track(&self, track_id: &str) -> bool;

    fn ice_gathering_state(&self) -> IceGatheringState;

    fn is_closed(&self) -> bool;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn create(&self, events: EventSink) -> Result<Box<dyn PeerConnection>>;
}
