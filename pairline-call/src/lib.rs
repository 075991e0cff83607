mod coordinator;
mod error;
mod session;
pub mod transport;

pub use coordinator::{
    CallRole, CallStatus, CoordinatorHandle, CoordinatorSnapshot, EndReason, NegotiationCoordinator,
    SessionSnapshot,
};
pub use error::{CallError, SessionError};
pub use session::{PeerSession, SignalingState};
pub use transport::{
    ConnectionEvent, ConnectionFactory, ConnectionState, EventSink, IceGatheringState,
    PeerConnection, TransportConfig, TransportEvent, WebRtcConnection, WebRtcConnectionFactory,
};
