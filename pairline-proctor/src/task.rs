use crate::pipeline::{ProctoringPipeline, StopSignal};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Self-rescheduling sampling loop around a [`ProctoringPipeline`].
///
/// Cancellation is cooperative: [`ProctorTask::stop`] flips a flag that the
/// loop checks between iterations, so an in-flight frame always completes.
pub struct ProctorTask {
    pipeline: Option<ProctoringPipeline>,
    stop: StopSignal,
    handle: Option<JoinHandle<ProctoringPipeline>>,
}

impl ProctorTask {
    pub fn new(pipeline: ProctoringPipeline) -> Self {
        Self {
            stop: pipeline.stop_signal(),
            pipeline: Some(pipeline),
            handle: None,
        }
    }

    /// Spawns the loop on the current runtime. Returns false if the task was
    /// already started or has been stopped.
    pub fn start(&mut self) -> bool {
        if self.stop.is_stopped() {
            warn!("Proctoring task was stopped and cannot be restarted");
            return false;
        }
        let Some(pipeline) = self.pipeline.take() else {
            return false;
        };

        let stop = self.stop.clone();
        self.handle = Some(tokio::spawn(sampling_loop(pipeline, stop)));
        true
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished()) && !self.stop.is_stopped()
    }

    /// Waits for the loop to observe the stop flag and returns the pipeline.
    /// Call [`ProctorTask::stop`] first or this waits indefinitely.
    pub async fn join(&mut self) -> Option<ProctoringPipeline> {
        if let Some(pipeline) = self.pipeline.take() {
            return Some(pipeline);
        }
        let handle = self.handle.take()?;
        match handle.await {
            Ok(pipeline) => Some(pipeline),
            Err(e) => {
                warn!("Proctoring loop terminated abnormally: {}", e);
                None
            }
        }
    }
}

impl Drop for ProctorTask {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

async fn sampling_loop(mut pipeline: ProctoringPipeline, stop: StopSignal) -> ProctoringPipeline {
    let mut refresh = tokio::time::interval(pipeline.frame_interval());
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Proctoring loop started");

    loop {
        refresh.tick().await;
        if stop.is_stopped() {
            break;
        }
        pipeline.tick(Instant::now()).await;
    }

    info!("Proctoring loop exited");
    pipeline
}
