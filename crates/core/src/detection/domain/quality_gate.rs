use std::fmt;

use ndarray::Array2;

use crate::detection::domain::face_detector::Detection;
use crate::shared::frame::Frame;
use crate::shared::geometry;

/// Pre-window filter for face crops.
///
/// A rejected detection still updates its track's positional state; it
/// just never contributes to the identity embedding window.
#[derive(Clone, Debug)]
pub struct QualityGate {
    /// Minimum shorter side of the face crop, in pixels.
    pub min_face_size: u32,
    /// Minimum variance-of-Laplacian sharpness of the grayscale crop.
    pub min_sharpness: f64,
    /// Minimum detector confidence.
    pub min_score: f64,
    /// Accepted bbox width/height ratio band, for detectors that need one.
    pub aspect_ratio_band: Option<(f64, f64)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Score,
    AspectRatio,
    EmptyCrop,
    FaceSize,
    Sharpness,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Score => "low confidence",
            Rejection::AspectRatio => "aspect ratio out of band",
            Rejection::EmptyCrop => "empty crop",
            Rejection::FaceSize => "face too small",
            Rejection::Sharpness => "crop too blurry",
        };
        write!(f, "{reason}")
    }
}

impl QualityGate {
    /// `None` means the detection passes every filter.
    pub fn evaluate(&self, frame: &Frame, detection: &Detection) -> Option<Rejection> {
        if detection.score < self.min_score {
            return Some(Rejection::Score);
        }
        if let Some((lo, hi)) = self.aspect_ratio_band {
            match geometry::aspect_ratio(&detection.bbox) {
                Some(ratio) if (lo..=hi).contains(&ratio) => {}
                _ => return Some(Rejection::AspectRatio),
            }
        }
        let Some(crop) = frame.crop(&detection.bbox) else {
            return Some(Rejection::EmptyCrop);
        };
        if crop.width().min(crop.height()) < self.min_face_size {
            return Some(Rejection::FaceSize);
        }
        if laplacian_variance(&crop) < self.min_sharpness {
            return Some(Rejection::Sharpness);
        }
        None
    }
}

/// Variance of the 4-neighbor Laplacian over the grayscale interior.
///
/// Crops smaller than 3x3 have no interior and score 0.
pub fn laplacian_variance(frame: &Frame) -> f64 {
    let w = frame.width() as usize;
    let h = frame.height() as usize;
    if w < 3 || h < 3 {
        return 0.0;
    }

    let gray: Vec<f64> = frame.grayscale().iter().map(|&v| v as f64).collect();
    let gray = Array2::from_shape_vec((h, w), gray).expect("grayscale length matches dimensions");

    let mut responses = Vec::with_capacity((h - 2) * (w - 2));
    for window in gray.windows((3, 3)) {
        let lap = window[[0, 1]] + window[[2, 1]] + window[[1, 0]] + window[[1, 2]]
            - 4.0 * window[[1, 1]];
        responses.push(lap);
    }

    let n = responses.len() as f64;
    let mean = responses.iter().sum::<f64>() / n;
    responses.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n
}
