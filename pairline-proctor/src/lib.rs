mod classifier;
mod detector;
mod limiter;
mod overlay;
mod pipeline;
mod restrictions;
mod smoother;
mod source;
mod task;

pub use classifier::{Classifier, Geometry, MissingKeypoint};
pub use detector::{DetectionSample, DetectorError, FaceDetector};
pub use limiter::AlertState;
pub use overlay::Overlay;
pub use pipeline::{FrameOutcome, ProctoringPipeline, SkipReason, StopSignal};
pub use restrictions::{ClientActivity, RestrictionMonitor, Role, violation_for};
pub use smoother::SignalSmoother;
pub use source::{SourceState, VideoFrame, VideoSource};
pub use task::ProctorTask;
