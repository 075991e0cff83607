mod connection;
mod connection_wrapper;
mod transport_config;
mod transport_event;

pub use connection::{ConnectionFactory, ConnectionState, IceGatheringState, PeerConnection};
pub use connection_wrapper::{WebRtcConnection, WebRtcConnectionFactory};
pub use transport_config::TransportConfig;
pub use transport_event::{ConnectionEvent, EventSink, TransportEvent};
