use crate::coordinator::call_status::{CallStatus, CoordinatorSnapshot};
use crate::coordinator::coordinator_command::CoordinatorCommand;
use crate::error::CallError;
use tokio::sync::{mpsc, oneshot, watch};

#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<CoordinatorCommand>,
    status: watch::Receiver<CallStatus>,
}

impl CoordinatorHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<CoordinatorCommand>,
        status: watch::Receiver<CallStatus>,
    ) -> Self {
        Self { commands, status }
    }

    pub async fn hang_up(&self) -> Result<(), CallError> {
        self.send(CoordinatorCommand::HangUp).await
    }

    pub async fn shutdown(&self) -> Result<(), CallError> {
        self.send(CoordinatorCommand::Shutdown).await
    }

    pub async fn snapshot(&self) -> Result<CoordinatorSnapshot, CallError> {
        let (tx, rx) = oneshot::channel();
        self.send(CoordinatorCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| CallError::Stopped)
    }

    pub fn status(&self) -> CallStatus {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<CallStatus> {
        self.status.clone()
    }

    async fn send(&self, command: CoordinatorCommand) -> Result<(), CallError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CallError::Stopped)
    }
}
