use crate::coordinator::call_status::CoordinatorSnapshot;
use tokio::sync::oneshot;

/// Commands from the local user to the coordinator.
#[derive(Debug)]
pub enum CoordinatorCommand {
    /// End the current call and notify the partner.
    HangUp,

    Snapshot(oneshot::Sender<CoordinatorSnapshot>),

    /// Leave the page: hang up if needed and stop the event loop.
    Shutdown,
}
