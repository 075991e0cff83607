use pairline_core::FaceDetection;

/// Drawing surface for local operator feedback. Never read back.
pub trait Overlay: Send {
    fn clear(&mut self, width: u32, height: u32);

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn fill_point(&mut self, x: f64, y: f64, radius: f64);
}

pub(crate) fn draw_detection(overlay: &mut dyn Overlay, face: &FaceDetection, width: u32, height: u32) {
    let (w, h) = (f64::from(width), f64::from(height));
    let bbox = &face.bounding_box;

    overlay.stroke_rect(bbox.origin_x * w, bbox.origin_y * h, bbox.width * w, bbox.height * h);
    for point in &face.keypoints {
        overlay.fill_point(point.x * w, point.y * h, 3.0);
    }
}
