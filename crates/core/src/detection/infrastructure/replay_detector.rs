use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::face_detector::{Detection, FaceDetector};
use crate::shared::frame::Frame;

/// Scripted detection stream for offline replay and validation runs.
///
/// The script is JSON Lines: one object per detector invocation, consumed
/// in call order. After the script is exhausted every call reports zero
/// detections, mirroring a quiet camera.
#[derive(Debug)]
pub struct ReplayDetector {
    entries: VecDeque<Vec<Detection>>,
}

#[derive(Error, Debug)]
pub enum ReplayScriptError {
    #[error("failed to read detection script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("detection script line {line} is not valid: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct ScriptEntry {
    #[serde(default)]
    detections: Vec<ScriptDetection>,
}

#[derive(Debug, Deserialize)]
struct ScriptDetection {
    bbox: [f64; 4],
    embedding: Vec<f32>,
    #[serde(default = "default_score")]
    score: f64,
}

fn default_score() -> f64 {
    1.0
}

impl ReplayDetector {
    pub fn from_file(path: &Path) -> Result<Self, ReplayScriptError> {
        let file = File::open(path).map_err(|e| ReplayScriptError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_reader(BufReader::new(file), path)
    }

    fn from_reader(
        reader: impl BufRead,
        path: &Path,
    ) -> Result<Self, ReplayScriptError> {
        let mut entries = VecDeque::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| ReplayScriptError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: ScriptEntry = serde_json::from_str(&line)
                .map_err(|e| ReplayScriptError::Parse {
                    line: idx + 1,
                    source: e,
                })?;
            entries.push_back(
                entry
                    .detections
                    .into_iter()
                    .map(|d| Detection {
                        bbox: d.bbox,
                        embedding: d.embedding,
                        score: d.score,
                    })
                    .collect(),
            );
        }
        Ok(Self { entries })
    }

    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

impl FaceDetector for ReplayDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        Ok(self.entries.pop_front().unwrap_or_default())
    }
}
