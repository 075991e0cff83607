use crate::session::SignalingState;
use pairline_core::{BusError, MediaError, ParticipantId, SdpKind};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("remote answer received in state {0:?}")]
    UnexpectedAnswer(SignalingState),

    #[error("expected {expected:?} description, got {got:?}")]
    WrongDescriptionKind { expected: SdpKind, got: SdpKind },

    #[error("remote offer collided with a pending local offer")]
    Glare,

    #[error("cannot {op} in state {state:?}")]
    InvalidState {
        op: &'static str,
        state: SignalingState,
    },

    #[error("connection error: {0:#}")]
    Connection(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("connection to {0} failed")]
    ConnectionFailed(ParticipantId),

    #[error("ICE gathering did not complete after {0} checks")]
    IceGatheringTimeout(u32),

    #[error("negotiation coordinator is not running")]
    Stopped,
}
