use crate::model::ParticipantId;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("relay channel closed")]
    Closed,

    #[error("participant {0} is not connected to the relay")]
    UnknownRecipient(ParticipantId),

    #[error("malformed bus event: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Capture failures are fatal for the call that requested the media.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("permission to capture media was denied")]
    PermissionDenied,
}
