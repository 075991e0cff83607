mod local;
mod subscription;

pub use local::{LocalBusClient, LocalRelay};
pub use subscription::{Subscription, SubscriptionId};

use crate::error::BusError;
use crate::model::Outbound;
use async_trait::async_trait;

/// Outbound half of the relay connection (the external message bus).
#[async_trait]
pub trait BusClient: Send + Sync {
    async fn emit(&self, event: Outbound) -> Result<(), BusError>;
}
