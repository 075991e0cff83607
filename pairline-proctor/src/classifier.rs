use crate::detector::DetectionSample;
use crate::smoother::SignalSmoother;
use pairline_core::{AlertKind, FaceDetection, KeypointName, ProctorConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("detection has no {0:?} keypoint")]
pub struct MissingKeypoint(pub KeypointName);

/// Raw per-frame measurements of a single face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub angle_deg: f64,
    pub center_x: f64,
    pub area: f64,
}

impl Geometry {
    pub fn measure(
        face: &FaceDetection,
        from: KeypointName,
        to: KeypointName,
    ) -> Result<Self, MissingKeypoint> {
        let a = face.keypoint(from).ok_or(MissingKeypoint(from))?;
        let b = face.keypoint(to).ok_or(MissingKeypoint(to))?;
        let angle_deg = (b.y - a.y).atan2(b.x - a.x).to_degrees();

        Ok(Self {
            angle_deg,
            center_x: face.bounding_box.center_x(),
            area: face.bounding_box.area(),
        })
    }
}

/// Maps detection samples to candidate alerts, smoothing the head-pose
/// signals across frames.
#[derive(Debug, Clone)]
pub struct Classifier {
    angle: SignalSmoother,
    center: SignalSmoother,
    angle_lower: f64,
    angle_upper: f64,
    center_left: f64,
    center_right: f64,
    min_face_area: f64,
    angle_from: KeypointName,
    angle_to: KeypointName,
}

impl Classifier {
    pub fn new(config: &ProctorConfig) -> Self {
        Self {
            angle: SignalSmoother::new(config.smoothing_window),
            center: SignalSmoother::new(config.smoothing_window),
            angle_lower: config.angle_lower_deg,
            angle_upper: config.angle_upper_deg,
            center_left: config.center_left,
            center_right: config.center_right,
            min_face_area: config.min_face_area,
            angle_from: config.angle_from,
            angle_to: config.angle_to,
        }
    }

    /// Fails when the single detected face lacks a tracked keypoint; the
    /// smoothers are left untouched in that case.
    pub fn classify(&mut self, sample: &DetectionSample) -> Result<Option<AlertKind>, MissingKeypoint> {
        match sample.faces.as_slice() {
            [] => Ok(Some(AlertKind::NoFace)),
            [face] => {
                let geometry = Geometry::measure(face, self.angle_from, self.angle_to)?;
                Ok(self.classify_geometry(geometry))
            }
            _ => Ok(Some(AlertKind::MultipleFaces)),
        }
    }

    fn classify_geometry(&mut self, geometry: Geometry) -> Option<AlertKind> {
        let angle = self.angle.push(geometry.angle_deg);
        let center = self.center.push(geometry.center_x);

        if self.is_looking_away(angle, center) {
            Some(AlertKind::HeadTurn)
        } else if geometry.area < self.min_face_area {
            Some(AlertKind::FaceTooSmall)
        } else {
            None
        }
    }

    /// Both bands compare absolute values; an angle at or outside either
    /// bound counts as turned away.
    pub fn is_looking_away(&self, smoothed_angle: f64, smoothed_center: f64) -> bool {
        let angle = smoothed_angle.abs();
        let center = smoothed_center.abs();

        (angle >= self.angle_upper || angle <= self.angle_lower)
            || (center > self.center_right || center < self.center_left)
    }

    pub fn smoothed_angle(&self) -> Option<f64> {
        self.angle.mean()
    }

    pub fn smoothed_center(&self) -> Option<f64> {
        self.center.mean()
    }

    pub fn reset(&mut self) {
        self.angle.clear();
        self.center.clear();
    }
}
