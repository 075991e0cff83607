use bytes::Bytes;
use pairline_core::{BoundingBox, FaceDetection, Keypoint, KeypointName};
use pairline_proctor::{DetectorError, FaceDetector, Overlay, SourceState, VideoFrame, VideoSource};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

pub fn frame_at(ms: u64) -> VideoFrame {
    VideoFrame {
        timestamp: Duration::from_millis(ms),
        width: FRAME_WIDTH,
        height: FRAME_HEIGHT,
        data: Bytes::from_static(&[0u8; 16]),
    }
}

/// Single face whose left-eye to nose line sits at `angle_deg`, with the
/// box centered at `center_x`.
pub fn face(center_x: f64, area: f64, angle_deg: f64) -> FaceDetection {
    let width = 100.0;
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    FaceDetection {
        bounding_box: BoundingBox {
            origin_x: center_x - width / 2.0,
            origin_y: 0.2,
            width,
            height: area / width,
        },
        keypoints: vec![
            Keypoint { name: KeypointName::RightEye, x: 0.45, y: 0.4 },
            Keypoint { name: KeypointName::LeftEye, x: 0.55, y: 0.4 },
            Keypoint { name: KeypointName::NoseTip, x: 0.55 + 0.05 * cos, y: 0.4 + 0.05 * sin },
        ],
    }
}

pub fn frontal_face() -> FaceDetection {
    face(310.0, 0.5, 121.5)
}

/// Video source that plays back `frames` in order and then keeps
/// returning the last one.
#[derive(Clone)]
pub struct ScriptedSource {
    state: Arc<Mutex<SourceState>>,
    frames: Arc<Mutex<VecDeque<VideoFrame>>>,
    last: Arc<Mutex<Option<VideoFrame>>>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = VideoFrame>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SourceState::Playing)),
            frames: Arc::new(Mutex::new(frames.into_iter().collect())),
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// `count` distinct frames, one per read.
    pub fn live(count: u64) -> Self {
        Self::new((1..=count).map(|i| frame_at(i * 33)))
    }

    pub fn set_state(&self, state: SourceState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn push_frame(&self, frame: VideoFrame) {
        self.frames.lock().unwrap().push_back(frame);
    }
}

impl VideoSource for ScriptedSource {
    fn state(&self) -> SourceState {
        *self.state.lock().unwrap()
    }

    fn current_frame(&mut self) -> Option<VideoFrame> {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.frames.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        last.clone()
    }
}

type Script = VecDeque<Result<Vec<FaceDetection>, DetectorError>>;

/// Detector that replays scripted results, then repeats `fallback`.
#[derive(Clone)]
pub struct ScriptedDetector {
    script: Arc<Mutex<Script>>,
    fallback: Arc<Mutex<Vec<FaceDetection>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedDetector {
    pub fn always(faces: Vec<FaceDetection>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(faces)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn then(self, result: Result<Vec<FaceDetection>, DetectorError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn set_fallback(&self, faces: Vec<FaceDetection>) {
        *self.fallback.lock().unwrap() = faces;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<FaceDetection>, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(self.fallback.lock().unwrap().clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(u32, u32),
    Rect(f64, f64, f64, f64),
    Point(f64, f64),
}

#[derive(Clone, Default)]
pub struct RecordingOverlay {
    pub ops: Arc<Mutex<Vec<DrawOp>>>,
}

impl RecordingOverlay {
    pub fn ops(&self) -> Vec<DrawOp> {
        self.ops.lock().unwrap().clone()
    }
}

impl Overlay for RecordingOverlay {
    fn clear(&mut self, width: u32, height: u32) {
        self.ops.lock().unwrap().push(DrawOp::Clear(width, height));
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.lock().unwrap().push(DrawOp::Rect(x, y, width, height));
    }

    fn fill_point(&mut self, x: f64, y: f64, _radius: f64) {
        self.ops.lock().unwrap().push(DrawOp::Point(x, y));
    }
}
