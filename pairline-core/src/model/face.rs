use serde::{Deserialize, Serialize};

/// Landmarks produced by the short-range face detector, in its output order.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeypointName {
    RightEye,
    LeftEye,
    NoseTip,
    Mouth,
    RightEarTragion,
    LeftEarTragion,
}

impl KeypointName {
    pub const DETECTOR_ORDER: [KeypointName; 6] = [
        KeypointName::RightEye,
        KeypointName::LeftEye,
        KeypointName::NoseTip,
        KeypointName::Mouth,
        KeypointName::RightEarTragion,
        KeypointName::LeftEarTragion,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: KeypointName,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center_x(&self) -> f64 {
        self.origin_x + self.width / 2.0
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetection {
    pub bounding_box: BoundingBox,
    pub keypoints: Vec<Keypoint>,
}

impl FaceDetection {
    pub fn keypoint(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.name == name)
    }
}
