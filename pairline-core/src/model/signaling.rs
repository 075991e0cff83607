use crate::error::BusError;
use crate::model::alert::{Alert, Violation};
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Events this client puts on the bus. Targeted events carry the recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum Outbound {
    Alert(Alert),
    Violation(Violation),
    Call {
        to: ParticipantId,
        offer: SessionDescription,
    },
    CallAccepted {
        to: ParticipantId,
        answer: SessionDescription,
    },
    NegoOffer {
        to: ParticipantId,
        offer: SessionDescription,
    },
    NegoDone {
        to: ParticipantId,
        answer: SessionDescription,
    },
    ReadyForStreams {
        to: ParticipantId,
    },
    CallEnded {
        to: ParticipantId,
    },
}

impl Outbound {
    pub fn name(&self) -> &'static str {
        match self {
            Outbound::Alert(_) => "alert",
            Outbound::Violation(_) => "violation",
            Outbound::Call { .. } => "call",
            Outbound::CallAccepted { .. } => "call-accepted",
            Outbound::NegoOffer { .. } => "nego-offer",
            Outbound::NegoDone { .. } => "nego-done",
            Outbound::ReadyForStreams { .. } => "ready-for-streams",
            Outbound::CallEnded { .. } => "call-ended",
        }
    }

    pub fn recipient(&self) -> Option<&ParticipantId> {
        match self {
            Outbound::Alert(_) | Outbound::Violation(_) => None,
            Outbound::Call { to, .. }
            | Outbound::CallAccepted { to, .. }
            | Outbound::NegoOffer { to, .. }
            | Outbound::NegoDone { to, .. }
            | Outbound::ReadyForStreams { to }
            | Outbound::CallEnded { to } => Some(to),
        }
    }

    pub fn to_json(&self) -> Result<String, BusError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Events delivered by the relay. Targeted events carry the sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum Inbound {
    PeerJoined {
        id: ParticipantId,
    },
    PeerLeft {
        id: ParticipantId,
    },
    Call {
        from: ParticipantId,
        offer: SessionDescription,
    },
    CallAccepted {
        from: ParticipantId,
        answer: SessionDescription,
    },
    NegoOffer {
        from: ParticipantId,
        offer: SessionDescription,
    },
    NegoFinal {
        #[serde(default)]
        from: Option<ParticipantId>,
        answer: SessionDescription,
    },
    ReadyForStreams {
        from: ParticipantId,
    },
    CallEnded {
        from: ParticipantId,
    },
    Alert(Alert),
    Violation(Violation),
}

impl Inbound {
    pub fn name(&self) -> &'static str {
        match self {
            Inbound::PeerJoined { .. } => "peer-joined",
            Inbound::PeerLeft { .. } => "peer-left",
            Inbound::Call { .. } => "call",
            Inbound::CallAccepted { .. } => "call-accepted",
            Inbound::NegoOffer { .. } => "nego-offer",
            Inbound::NegoFinal { .. } => "nego-final",
            Inbound::ReadyForStreams { .. } => "ready-for-streams",
            Inbound::CallEnded { .. } => "call-ended",
            Inbound::Alert(_) => "alert",
            Inbound::Violation(_) => "violation",
        }
    }

    pub fn from_json(text: &str) -> Result<Self, BusError> {
        Ok(serde_json::from_str(text)?)
    }
}
