use bytes::Bytes;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Playing,
    Paused,
    Ended,
}

/// Decoded frame of the local camera feed.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Media time of the frame. Unchanged between two reads means no new frame.
    pub timestamp: Duration,
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

/// The video element the pipeline samples from.
pub trait VideoSource: Send {
    fn state(&self) -> SourceState;

    /// Latest decoded frame, if any has been produced yet.
    fn current_frame(&mut self) -> Option<VideoFrame>;
}
