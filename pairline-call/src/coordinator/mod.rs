mod call_status;
mod coordinator_command;
mod handle;
mod negotiation_coordinator;

pub use call_status::{CallRole, CallStatus, CoordinatorSnapshot, EndReason, SessionSnapshot};
pub use handle::CoordinatorHandle;
pub use negotiation_coordinator::NegotiationCoordinator;
