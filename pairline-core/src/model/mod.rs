mod alert;
mod face;
mod media;
mod participant;
mod room;
mod signaling;

pub use alert::{Alert, AlertKind, Violation, ViolationKind};
pub use face::{BoundingBox, FaceDetection, Keypoint, KeypointName};
pub use media::{CapturedMedia, LocalStream, MediaSource, MediaTrack, RemoteStream, RemoteTrack, TrackKind};
pub use participant::ParticipantId;
pub use room::RoomId;
pub use signaling::{IceServerConfig, Inbound, Outbound, SdpKind, SessionDescription};
