use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::quality_gate::QualityGate;
use crate::dispatch::gate::GateConfig;
use crate::tracking::tracker::{AssociationConfig, WindowConfig};

/// Complete tuning surface of the engine.
///
/// Every field has a documented default and is independently overridable,
/// via a JSON config file or programmatically. Defaults mirror the
/// production worker deployment.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum gallery similarity for a known match.
    pub similarity_threshold: f64,
    /// Minimum gap between the best and runner-up gallery scores.
    pub min_margin: f64,
    /// Seconds between two dispatches for the same camera+identity.
    pub cooldown_seconds: f64,
    /// Run detection on every Nth frame per camera.
    pub frame_stride: u64,
    /// Frames wider than this are downscaled before detection.
    pub max_inference_width: u32,
    /// Dispatch "unknown" resolutions instead of discarding them.
    pub send_unknown: bool,
    /// Seconds between heartbeat log lines.
    pub heartbeat_seconds: f64,
    /// Outbound HTTP request timeout, in seconds.
    pub http_timeout_seconds: f64,
    /// Detector input size hint, forwarded to the detector collaborator.
    pub detector_size: u32,
    /// Detector model identifier, forwarded to the detector collaborator.
    pub detector_model: String,
    /// Minimum box overlap for track association.
    pub iou_threshold: f64,
    /// Embedding-similarity association gate; `null` disables the
    /// embedding term (IOU-only association).
    pub embedding_threshold: Option<f64>,
    /// Seconds without a detection before a track is evicted.
    pub track_ttl: f64,
    /// Embedding window capacity per track.
    pub max_window: usize,
    /// Minimum seconds between snapshot enqueues per track.
    pub enqueue_interval: f64,
    /// Embeddings required before a window can mature.
    pub min_window_frames: usize,
    /// Consecutive identical resolutions required before dispatch.
    pub min_confirm_hits: u32,
    /// Similarity to a track's last embedding below which its identity
    /// sub-state is reset.
    pub identity_break_threshold: f64,
    /// Minimum shorter side of a face crop, in pixels.
    pub min_face_size: u32,
    /// Minimum variance-of-Laplacian sharpness of a face crop.
    pub min_blur_score: f64,
    /// Minimum detector confidence admitted to the embedding window.
    pub min_detector_score: f64,
    /// Accepted bbox width/height ratio band, for detectors that need one.
    pub aspect_ratio_band: Option<(f64, f64)>,
    /// Snapshot queue capacity.
    pub queue_capacity: usize,
    /// Matched snapshots drained per tick.
    pub drain_per_tick: usize,
    /// Idle sleep between ticks, in milliseconds.
    pub tick_sleep_ms: u64,
    /// Stop after this many ticks (replay runs); `null` runs until
    /// cancelled.
    pub max_ticks: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.30,
            min_margin: 0.04,
            cooldown_seconds: 3.0,
            frame_stride: 2,
            max_inference_width: 960,
            send_unknown: false,
            heartbeat_seconds: 20.0,
            http_timeout_seconds: 5.0,
            detector_size: 640,
            detector_model: "buffalo_l".to_string(),
            iou_threshold: 0.3,
            embedding_threshold: None,
            track_ttl: 1.5,
            max_window: 5,
            enqueue_interval: 0.7,
            min_window_frames: 3,
            min_confirm_hits: 1,
            identity_break_threshold: 0.2,
            min_face_size: 40,
            min_blur_score: 10.0,
            min_detector_score: 0.0,
            aspect_ratio_band: None,
            queue_capacity: 150,
            drain_per_tick: 3,
            tick_sleep_ms: 20,
            max_ticks: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl EngineConfig {
    /// Loads a JSON config file. Absent fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let body = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&body).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn association(&self) -> AssociationConfig {
        AssociationConfig {
            iou_threshold: self.iou_threshold,
            embedding_threshold: self.embedding_threshold,
            track_ttl: self.track_ttl,
            identity_break_threshold: self.identity_break_threshold,
        }
    }

    pub fn window(&self) -> WindowConfig {
        WindowConfig {
            max_window: self.max_window,
            min_window_frames: self.min_window_frames,
            enqueue_interval: self.enqueue_interval,
        }
    }

    pub fn gate(&self) -> GateConfig {
        GateConfig {
            min_confirm_hits: self.min_confirm_hits,
            cooldown_seconds: self.cooldown_seconds,
            send_unknown: self.send_unknown,
        }
    }

    pub fn quality(&self) -> QualityGate {
        QualityGate {
            min_face_size: self.min_face_size,
            min_sharpness: self.min_blur_score,
            min_score: self.min_detector_score,
            aspect_ratio_band: self.aspect_ratio_band,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.http_timeout_seconds)
    }
}
