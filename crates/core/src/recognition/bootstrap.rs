use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::domain::face_detector::{Detection, FaceDetector};
use crate::recognition::gallery::{canonical_name, Gallery};
use crate::shared::constants::{GALLERY_MANIFEST, IMAGE_EXTENSIONS};
use crate::shared::embedding;
use crate::shared::frame::Frame;
use crate::shared::geometry::box_area;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("failed to read gallery directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Builds the known-identity gallery from a directory of reference
/// images.
///
/// For each image: decode, detect, keep the largest face, and bucket its
/// embedding under the canonicalized file-stem name. Unusable images
/// (decode failure, no face, degenerate embedding) are skipped with a
/// logged reason; the bootstrap still yields whatever gallery remains.
/// Each identity's stored entry is the re-normalized mean of its bucket.
pub fn load_gallery(
    dir: &Path,
    detector: &mut dyn FaceDetector,
) -> Result<Gallery, GalleryError> {
    let mut buckets: Vec<(String, Vec<Vec<f32>>)> = Vec::new();

    for path in candidate_files(dir)? {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let frame = match decode_image(&path) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("gallery image skipped (decode failed): {file_name}: {e}");
                continue;
            }
        };
        let detections = match detector.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("gallery image skipped (detect failed): {file_name}: {e}");
                continue;
            }
        };
        let Some(face) = largest_face(&detections) else {
            log::warn!("gallery image skipped (no face): {file_name}");
            continue;
        };
        let Some(unit) = embedding::normalized(&face.embedding) else {
            log::warn!("gallery image skipped (zero-norm embedding): {file_name}");
            continue;
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = canonical_name(&stem);
        match buckets.iter_mut().find(|(n, _)| *n == name) {
            Some((_, bucket)) => bucket.push(unit),
            None => buckets.push((name, vec![unit])),
        }
        log::info!("gallery image loaded: {file_name}");
    }

    let mut gallery = Gallery::new();
    for (name, bucket) in &buckets {
        let vectors: Vec<&[f32]> = bucket.iter().map(|v| v.as_slice()).collect();
        if let Some(mean) = embedding::mean_normalized(&vectors) {
            gallery.insert(name, mean);
        }
    }
    log::info!("gallery ready: {} identities", gallery.len());
    Ok(gallery)
}

/// Reference image paths, honoring the optional `images.json` manifest.
///
/// The manifest (a JSON array of file names) controls selection and order
/// when present and usable; otherwise the directory is scanned for known
/// image extensions in sorted order.
fn candidate_files(dir: &Path) -> Result<Vec<PathBuf>, GalleryError> {
    if let Some(files) = manifest_files(dir) {
        if !files.is_empty() {
            return Ok(files);
        }
    }

    let entries = std::fs::read_dir(dir).map_err(|e| GalleryError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn manifest_files(dir: &Path) -> Option<Vec<PathBuf>> {
    let manifest = dir.join(GALLERY_MANIFEST);
    let body = std::fs::read_to_string(&manifest).ok()?;
    match serde_json::from_str::<Vec<String>>(&body) {
        Ok(names) => Some(
            names
                .iter()
                .map(|name| dir.join(name))
                .filter(|path| path.exists())
                .collect(),
        ),
        Err(e) => {
            log::warn!("ignoring unreadable {}: {e}", manifest.display());
            None
        }
    }
}

fn decode_image(path: &Path) -> Result<Frame, image::ImageError> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::new(rgb.into_raw(), width, height, 3, 0))
}

fn largest_face(detections: &[Detection]) -> Option<&Detection> {
    detections
        .iter()
        .max_by(|a, b| {
            box_area(&a.bbox)
                .partial_cmp(&box_area(&b.bbox))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}
