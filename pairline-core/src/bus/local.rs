use crate::bus::BusClient;
use crate::bus::subscription::{Subscription, SubscriptionId};
use crate::error::BusError;
use crate::model::{Inbound, Outbound, ParticipantId, RoomId};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct Member {
    room: RoomId,
    subscription: SubscriptionId,
    tx: mpsc::UnboundedSender<Inbound>,
}

struct RelayInner {
    members: DashMap<ParticipantId, Member>,
}

impl RelayInner {
    /// Targeted delivery never crosses rooms.
    fn deliver(&self, room: &RoomId, to: &ParticipantId, event: Inbound) -> Result<(), BusError> {
        let Some(member) = self.members.get(to).filter(|m| &m.room == room) else {
            return Err(BusError::UnknownRecipient(to.clone()));
        };
        member.tx.send(event).map_err(|_| BusError::Closed)
    }

    fn multicast(&self, room: &RoomId, except: &ParticipantId, event: Inbound) {
        // collect first: sending while iterating would hold shard guards
        let targets: Vec<_> = self
            .members
            .iter()
            .filter(|m| &m.value().room == room && m.key() != except)
            .map(|m| m.value().tx.clone())
            .collect();

        for tx in targets {
            let _ = tx.send(event.clone());
        }
    }

    fn leave(&self, id: &ParticipantId, subscription: SubscriptionId) {
        let Some((_, member)) = self
            .members
            .remove_if(id, |_, m| m.subscription == subscription)
        else {
            return;
        };
        info!("Participant {} left room {}", id, member.room);
        self.multicast(&member.room, id, Inbound::PeerLeft { id: id.clone() });
    }
}

/// In-process relay with the delivery semantics of the signaling server:
/// room-scoped multicast, targeted events rewritten from `to` to `from`.
#[derive(Clone)]
pub struct LocalRelay {
    inner: Arc<RelayInner>,
}

impl LocalRelay {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                members: DashMap::new(),
            }),
        }
    }

    pub fn join(&self, room: RoomId) -> (LocalBusClient, Subscription) {
        self.join_as(ParticipantId::generate(), room)
    }

    /// Join `room` under a fixed id. Existing members receive `peer-joined`.
    pub fn join_as(&self, id: ParticipantId, room: RoomId) -> (LocalBusClient, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription_id = SubscriptionId::new();

        self.inner.multicast(&room, &id, Inbound::PeerJoined { id: id.clone() });
        self.inner.members.insert(
            id.clone(),
            Member {
                room: room.clone(),
                subscription: subscription_id,
                tx,
            },
        );
        info!("Participant {} joined room {}", id, room);

        let inner = self.inner.clone();
        let leaving = id.clone();
        let subscription = Subscription::new(subscription_id, rx, move |sub| {
            inner.leave(&leaving, sub);
        });

        let client = LocalBusClient {
            id,
            room,
            inner: self.inner.clone(),
        };
        (client, subscription)
    }

    pub fn members(&self, room: &RoomId) -> Vec<ParticipantId> {
        self.inner
            .members
            .iter()
            .filter(|m| &m.value().room == room)
            .map(|m| m.key().clone())
            .collect()
    }
}

impl Default for LocalRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct LocalBusClient {
    id: ParticipantId,
    room: RoomId,
    inner: Arc<RelayInner>,
}

impl LocalBusClient {
    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }
}

#[async_trait]
impl BusClient for LocalBusClient {
    async fn emit(&self, event: Outbound) -> Result<(), BusError> {
        debug!("[{}] -> {}", self.id, event.name());
        let from = self.id.clone();

        let (to, inbound) = match event {
            Outbound::Alert(alert) => {
                self.inner.multicast(&self.room, &from, Inbound::Alert(alert));
                return Ok(());
            }
            Outbound::Violation(violation) => {
                self.inner
                    .multicast(&self.room, &from, Inbound::Violation(violation));
                return Ok(());
            }
            Outbound::Call { to, offer } => (to, Inbound::Call { from, offer }),
            Outbound::CallAccepted { to, answer } => (to, Inbound::CallAccepted { from, answer }),
            Outbound::NegoOffer { to, offer } => (to, Inbound::NegoOffer { from, offer }),
            Outbound::NegoDone { to, answer } => (
                to,
                Inbound::NegoFinal {
                    from: Some(from),
                    answer,
                },
            ),
            Outbound::ReadyForStreams { to } => (to, Inbound::ReadyForStreams { from }),
            Outbound::CallEnded { to } => (to, Inbound::CallEnded { from }),
        };

        if let Err(e) = self.inner.deliver(&self.room, &to, inbound) {
            warn!("[{}] relay could not deliver to {}: {}", self.id, to, e);
            return Err(e);
        }
        Ok(())
    }
}
