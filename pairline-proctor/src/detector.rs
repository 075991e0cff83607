use crate::source::VideoFrame;
use pairline_core::FaceDetection;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("face model is not loaded")]
    NotReady,

    #[error("inference failed: {0}")]
    Inference(String),
}

/// External face-geometry model.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<FaceDetection>, DetectorError>;
}

/// Detector output for one frame.
#[derive(Debug, Clone)]
pub struct DetectionSample {
    pub timestamp: Duration,
    pub faces: Vec<FaceDetection>,
}
