use std::time::{Duration, Instant};

use thiserror::Error;

use crate::detection::domain::face_detector::{Detection, FaceDetector};
use crate::detection::domain::quality_gate::QualityGate;
use crate::dispatch::domain::notifier::Notifier;
use crate::dispatch::gate::DispatchGate;
use crate::pipeline::camera::Camera;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::config::EngineConfig;
use crate::pipeline::snapshot_queue::SnapshotQueue;
use crate::recognition::gallery::Gallery;
use crate::recognition::matcher::best_match;
use crate::shared::embedding;
use crate::tracking::tracker::{Tracker, WindowConfig};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no cameras configured")]
    NoCameras,
}

#[derive(Clone, Copy, Debug, Default)]
struct TickStats {
    ready: usize,
    detected: usize,
    filtered: usize,
}

/// Single-threaded per-tick orchestration of the whole pipeline:
/// frame → detect → track → mature → match → gate → notify.
///
/// All mutable state (tracks, gallery, cooldowns, queue) is exclusively
/// owned by the loop; blocking collaborators are accepted as
/// backpressure within the tick. Cameras are visited in construction
/// order every tick.
pub struct Engine {
    config: EngineConfig,
    cameras: Vec<Camera>,
    detector: Box<dyn FaceDetector>,
    gallery: Gallery,
    notifier: Box<dyn Notifier>,
    tracker: Tracker,
    gate: DispatchGate,
    quality: QualityGate,
    window: WindowConfig,
    queue: SnapshotQueue,
    cancel: CancelToken,
    last_heartbeat: f64,
    stats: TickStats,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        cameras: Vec<Camera>,
        detector: Box<dyn FaceDetector>,
        gallery: Gallery,
        notifier: Box<dyn Notifier>,
        cancel: CancelToken,
    ) -> Result<Self, EngineError> {
        if cameras.is_empty() {
            return Err(EngineError::NoCameras);
        }
        Ok(Self {
            tracker: Tracker::new(config.association()),
            gate: DispatchGate::new(config.gate()),
            quality: config.quality(),
            window: config.window(),
            queue: SnapshotQueue::new(config.queue_capacity),
            config,
            cameras,
            detector,
            gallery,
            notifier,
            cancel,
            last_heartbeat: 0.0,
            stats: TickStats::default(),
        })
    }

    /// Blocking run loop. Connects every camera, then ticks until the
    /// cancellation token is set (finishing the in-flight tick) or the
    /// configured tick budget runs out. Camera resources are released on
    /// the way out.
    pub fn run(&mut self) {
        for camera in &mut self.cameras {
            camera.connect();
        }

        let started = Instant::now();
        let mut ticks = 0u64;
        while !self.cancel.is_cancelled() {
            if self.config.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            self.tick(started.elapsed().as_secs_f64());
            ticks += 1;
            std::thread::sleep(Duration::from_millis(self.config.tick_sleep_ms));
        }

        for camera in &mut self.cameras {
            camera.release();
        }
        log::info!("engine stopped after {ticks} ticks");
    }

    /// One pass over all cameras plus a bounded queue drain. `now` is in
    /// monotonic seconds; callers own the clock.
    pub fn tick(&mut self, now: f64) {
        let mut stats = TickStats::default();

        let mut cameras = std::mem::take(&mut self.cameras);
        for camera in &mut cameras {
            self.observe_camera(camera, now, &mut stats);
        }
        self.cameras = cameras;

        self.tracker.evict_stale(now);
        self.drain_matches(now);

        self.stats = stats;
        self.heartbeat(now);
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    fn observe_camera(&mut self, camera: &mut Camera, now: f64, stats: &mut TickStats) {
        let Some(frame) = camera.read() else {
            return;
        };
        stats.ready += 1;
        if camera.frame_no() % self.config.frame_stride != 0 {
            return;
        }

        let frame = if frame.width() > self.config.max_inference_width {
            frame.resize_to_width(self.config.max_inference_width)
        } else {
            frame
        };

        let detections = match self.detector.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("[{}] detection failed: {e}", camera.id());
                return;
            }
        };
        // Unit-length invariant holds from here on; zero-norm vectors are
        // discarded before they can reach a track.
        let detections: Vec<Detection> = detections
            .into_iter()
            .filter_map(|mut det| {
                let unit = embedding::normalized(&det.embedding)?;
                det.embedding = unit;
                Some(det)
            })
            .collect();
        if detections.is_empty() {
            return;
        }
        stats.detected += detections.len();

        let assigned = self.tracker.assign(camera.id(), &detections, now);
        for (det, track_id) in detections.iter().zip(&assigned) {
            if let Some(rejection) = self.quality.evaluate(&frame, det) {
                stats.filtered += 1;
                log::debug!("[{}] face filtered ({rejection})", camera.id());
                continue;
            }
            let Some(snapshot) =
                self.tracker
                    .absorb(*track_id, det.embedding.clone(), now, &self.window)
            else {
                continue;
            };
            if self.queue.push(snapshot) {
                log::debug!("[{}] queued snapshot for matching", camera.id());
            } else {
                log::debug!("[{}] snapshot queue full, dropping", camera.id());
            }
        }
    }

    fn drain_matches(&mut self, now: f64) {
        let mut processed = 0;
        while processed < self.config.drain_per_tick {
            let Some(snapshot) = self.queue.pop() else {
                break;
            };
            processed += 1;

            let outcome = best_match(&snapshot.embedding, &self.gallery);
            let resolution =
                outcome.resolve(self.config.similarity_threshold, self.config.min_margin);

            let Some(track) = self.tracker.get_mut(snapshot.track_id) else {
                log::debug!(
                    "[{}] track {} gone before matching",
                    snapshot.camera_id,
                    snapshot.track_id
                );
                continue;
            };
            let Some(event) = self.gate.process(track, &resolution, now) else {
                continue;
            };

            log::info!(
                "[{}] match name={} score={:.3} sending",
                snapshot.camera_id,
                resolution.label,
                resolution.score
            );
            match self.notifier.notify(&event) {
                Ok(()) => log::info!("[{}] sent name={}", snapshot.camera_id, resolution.label),
                Err(e) => log::warn!("[{}] send failed: {e}", snapshot.camera_id),
            }
        }
    }

    fn heartbeat(&mut self, now: f64) {
        if now - self.last_heartbeat < self.config.heartbeat_seconds {
            return;
        }
        log::info!(
            "heartbeat: cameras_ready={}/{} faces_detected={} faces_filtered={}",
            self.stats.ready,
            self.cameras.len(),
            self.stats.detected,
            self.stats.filtered
        );
        self.last_heartbeat = now;
    }
}
