use crate::model::Inbound;
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Release = Box<dyn FnOnce(SubscriptionId) + Send + Sync>;

/// Registered handler for inbound bus events.
///
/// Unregisters itself from the bus when dropped, so every registration
/// has exactly one matching teardown.
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<Inbound>,
    release: Option<Release>,
}

impl Subscription {
    pub fn new<F>(id: SubscriptionId, rx: mpsc::UnboundedReceiver<Inbound>, release: F) -> Self
    where
        F: FnOnce(SubscriptionId) + Send + Sync + 'static,
    {
        Self {
            id,
            rx,
            release: Some(Box::new(release)),
        }
    }

    /// Subscription backed by a plain channel, with nothing to unregister.
    pub fn detached(rx: mpsc::UnboundedReceiver<Inbound>) -> Self {
        Self {
            id: SubscriptionId::new(),
            rx,
            release: None,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<Inbound> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Inbound> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Inbound;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Inbound>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
