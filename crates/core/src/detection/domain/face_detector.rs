use crate::shared::frame::Frame;

/// One face found in one frame: bounding box, identity embedding, and
/// detector confidence. Produced fresh every tick; never persisted.
#[derive(Clone, Debug)]
pub struct Detection {
    /// `[x1, y1, x2, y2]` in the coordinates of the frame handed to
    /// `detect`.
    pub bbox: [f64; 4],
    /// Identity embedding. The engine re-normalizes to unit length and
    /// discards zero-norm vectors, so implementations need not guarantee it.
    pub embedding: Vec<f32>,
    pub score: f64,
}

/// Domain interface for the face detector/embedder collaborator.
///
/// Implementations may be stateful (model sessions, scripted streams),
/// hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
