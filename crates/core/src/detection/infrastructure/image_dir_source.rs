use std::path::{Path, PathBuf};

use crate::detection::domain::frame_source::FrameSource;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Frame source backed by a directory of still images, served in sorted
/// file-name order. Stands in for a live stream during replay runs.
///
/// `connect` re-lists the directory and rewinds, so a source that signals
/// a failed read is replayed from the start by the engine's reconnect.
pub struct ImageDirSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
}

impl ImageDirSource {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            files: Vec::new(),
            next: 0,
        }
    }
}

impl FrameSource for ImageDirSource {
    fn connect(&mut self) -> bool {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("cannot open frame directory {}: {e}", self.dir.display());
                return false;
            }
        };

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

        self.files = files;
        self.next = 0;
        !self.files.is_empty()
    }

    fn read(&mut self) -> Option<Frame> {
        let path = self.files.get(self.next)?;
        let index = self.next;
        self.next += 1;

        match image::open(path) {
            Ok(img) => {
                let rgb = img.to_rgb8();
                let (width, height) = rgb.dimensions();
                Some(Frame::new(rgb.into_raw(), width, height, 3, index))
            }
            Err(e) => {
                log::warn!("frame decode failed for {}: {e}", path.display());
                None
            }
        }
    }

    fn release(&mut self) {
        self.files.clear();
        self.next = 0;
    }
}
