use crate::classifier::Classifier;
use crate::detector::{DetectionSample, FaceDetector};
use crate::limiter::AlertState;
use crate::overlay::{Overlay, draw_detection};
use crate::source::{SourceState, VideoFrame, VideoSource};
use pairline_core::{Alert, AlertKind, BusClient, Outbound, ProctorConfig, RoomId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Stopped,
    Paused,
    Ended,
    NoFrame,
    DuplicateFrame,
    DetectorFailed,
    MissingKeypoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Skipped(SkipReason),
    Nominal,
    /// Candidate alert held back by the cooldown.
    Suppressed(AlertKind),
    Alerted(AlertKind),
    /// Alert passed the gate but the bus rejected it.
    Undelivered(AlertKind),
}

/// Shared stop flag. Once set, every later frame is a no-op.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct ProctoringPipeline {
    room_id: RoomId,
    source: Box<dyn VideoSource>,
    detector: Box<dyn FaceDetector>,
    overlay: Option<Box<dyn Overlay>>,
    bus: Arc<dyn BusClient>,
    classifier: Classifier,
    alerts: AlertState,
    last_timestamp: Option<Duration>,
    stop: StopSignal,
    frame_interval: Duration,
}

impl ProctoringPipeline {
    pub fn new(
        room_id: RoomId,
        source: Box<dyn VideoSource>,
        detector: Box<dyn FaceDetector>,
        bus: Arc<dyn BusClient>,
        config: &ProctorConfig,
    ) -> Self {
        Self {
            room_id,
            source,
            detector,
            overlay: None,
            bus,
            classifier: Classifier::new(config),
            alerts: AlertState::new(config.alert_cooldown()),
            last_timestamp: None,
            stop: StopSignal::default(),
            frame_interval: config.frame_interval(),
        }
    }

    pub fn with_overlay(mut self, overlay: Box<dyn Overlay>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn stop(&self) {
        if !self.stop.is_stopped() {
            info!("Proctoring stopped for room {}", self.room_id);
        }
        self.stop.stop();
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn alert_state(&self) -> &AlertState {
        &self.alerts
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// One iteration of the sampling loop: read the current frame and run it
    /// through detection, classification and the alert gate.
    pub async fn tick(&mut self, now: Instant) -> FrameOutcome {
        if self.stop.is_stopped() {
            return FrameOutcome::Skipped(SkipReason::Stopped);
        }

        match self.source.state() {
            SourceState::Paused => return FrameOutcome::Skipped(SkipReason::Paused),
            SourceState::Ended => return FrameOutcome::Skipped(SkipReason::Ended),
            SourceState::Playing => {}
        }

        let Some(frame) = self.source.current_frame() else {
            return FrameOutcome::Skipped(SkipReason::NoFrame);
        };
        self.process_frame(&frame, now).await
    }

    pub async fn process_frame(&mut self, frame: &VideoFrame, now: Instant) -> FrameOutcome {
        if self.stop.is_stopped() {
            return FrameOutcome::Skipped(SkipReason::Stopped);
        }
        if self.last_timestamp == Some(frame.timestamp) {
            return FrameOutcome::Skipped(SkipReason::DuplicateFrame);
        }
        self.last_timestamp = Some(frame.timestamp);

        if let Some(overlay) = self.overlay.as_deref_mut() {
            overlay.clear(frame.width, frame.height);
        }

        let faces = match self.detector.detect(frame) {
            Ok(faces) => faces,
            Err(e) => {
                warn!("Face detection failed at {:?}: {}", frame.timestamp, e);
                return FrameOutcome::Skipped(SkipReason::DetectorFailed);
            }
        };
        let sample = DetectionSample {
            timestamp: frame.timestamp,
            faces,
        };

        if let ([face], Some(overlay)) = (sample.faces.as_slice(), self.overlay.as_deref_mut()) {
            draw_detection(overlay, face, frame.width, frame.height);
        }

        let candidate = match self.classifier.classify(&sample) {
            Ok(candidate) => candidate,
            Err(e) => {
                debug!("Skipping frame at {:?}: {}", frame.timestamp, e);
                return FrameOutcome::Skipped(SkipReason::MissingKeypoints);
            }
        };

        let Some(kind) = candidate else {
            return FrameOutcome::Nominal;
        };
        self.dispatch(kind, now).await
    }

    async fn dispatch(&mut self, kind: AlertKind, now: Instant) -> FrameOutcome {
        if !self.alerts.should_emit(kind, now) {
            debug!("Alert '{}' suppressed by cooldown", kind);
            return FrameOutcome::Suppressed(kind);
        }

        info!("Raising alert '{}' for room {}", kind, self.room_id);
        let event = Outbound::Alert(Alert::new(kind, self.room_id.clone()));
        match self.bus.emit(event).await {
            Ok(()) => FrameOutcome::Alerted(kind),
            Err(e) => {
                error!("Failed to deliver alert '{}': {}", kind, e);
                FrameOutcome::Undelivered(kind)
            }
        }
    }
}
