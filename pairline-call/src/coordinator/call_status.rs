use crate::session::SignalingState;
use pairline_core::{ParticipantId, RemoteStream};

/// Which side initiated the call. The callee yields on offer collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRole {
    Caller,
    Callee,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    LocalHangup,
    RemoteHangup,
    MediaUnavailable(String),
    NegotiationFailed(String),
}

/// Call progress as observed by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStatus {
    Idle,
    Negotiating {
        remote: ParticipantId,
    },
    Streaming {
        remote: ParticipantId,
        stream: RemoteStream,
    },
    Ended {
        reason: EndReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub remote: ParticipantId,
    pub state: SignalingState,
    pub generation: u64,
    pub pending_negotiation: bool,
    pub remote_stream: Option<RemoteStream>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorSnapshot {
    pub partner: Option<ParticipantId>,
    pub role: Option<CallRole>,
    pub media_acquired: bool,
    pub sessions: Vec<SessionSnapshot>,
}

impl CoordinatorSnapshot {
    pub fn session(&self, remote: &ParticipantId) -> Option<&SessionSnapshot> {
        self.sessions.iter().find(|s| &s.remote == remote)
    }
}
