pub mod bus;
pub mod config;
mod error;
pub mod model;
pub mod utils;

pub use bus::{BusClient, LocalBusClient, LocalRelay, Subscription, SubscriptionId};
pub use config::{CallConfig, PairlineConfig, ProctorConfig};
pub use error::{BusError, MediaError};
pub use model::*;
