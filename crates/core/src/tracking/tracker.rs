use std::collections::BTreeMap;

use crate::detection::domain::face_detector::Detection;
use crate::shared::embedding;
use crate::shared::geometry::overlap_ratio;
use crate::tracking::track::Track;

/// Association tuning for one tracker instance.
#[derive(Clone, Debug)]
pub struct AssociationConfig {
    /// Minimum box overlap for an existing track to be an eligible
    /// candidate.
    pub iou_threshold: f64,
    /// Embedding-similarity eligibility gate; `None` disables the
    /// embedding term entirely (IOU-only association).
    pub embedding_threshold: Option<f64>,
    /// Seconds without a detection before a track is evicted.
    pub track_ttl: f64,
    /// Similarity to the track's last embedding below which the identity
    /// sub-state is reset.
    pub identity_break_threshold: f64,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            embedding_threshold: None,
            track_ttl: 1.5,
            identity_break_threshold: 0.2,
        }
    }
}

/// Embedding-window maturation tuning.
#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub max_window: usize,
    pub min_window_frames: usize,
    pub enqueue_interval: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_window: 5,
            min_window_frames: 3,
            enqueue_interval: 0.7,
        }
    }
}

/// A matured, averaged identity signal awaiting gallery matching.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub camera_id: String,
    pub track_id: u64,
    pub embedding: Vec<f32>,
    pub captured_at: f64,
}

/// Associates per-frame detections with persistent tracks.
///
/// Association is greedy and computed independently per detection: each
/// detection picks its own best eligible track, and a later detection in
/// the same tick may claim a track an earlier one already updated,
/// overwriting its effect. This locally-best behavior is the contract;
/// do not replace it with a global assignment.
pub struct Tracker {
    config: AssociationConfig,
    tracks: BTreeMap<u64, Track>,
    next_id: u64,
}

impl Tracker {
    pub fn new(config: AssociationConfig) -> Self {
        Self {
            config,
            tracks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Associates each detection with an existing same-camera track or a
    /// freshly created one, updating positional state, identity
    /// continuity, and the stored embedding. Returns one track id per
    /// detection, in order.
    ///
    /// Embeddings must already be unit length.
    pub fn assign(&mut self, camera_id: &str, detections: &[Detection], now: f64) -> Vec<u64> {
        let break_threshold = self.config.identity_break_threshold;
        detections
            .iter()
            .map(|det| {
                let id = match self.best_candidate(camera_id, det) {
                    Some(id) => id,
                    None => self.spawn(camera_id, det.bbox, now),
                };
                if let Some(track) = self.tracks.get_mut(&id) {
                    track.mark_seen(det.bbox, now);
                    if track.check_identity_break(&det.embedding, break_threshold) {
                        log::debug!("[{camera_id}] track {id} identity break");
                    }
                    track.remember_embedding(det.embedding.clone());
                }
                id
            })
            .collect()
    }

    /// Eligible candidate maximizing `0.5*iou + 0.5*max(0, emb)`. Ties go
    /// to the earliest-created track (strict `>` over ascending-id order).
    fn best_candidate(&self, camera_id: &str, det: &Detection) -> Option<u64> {
        let mut best: Option<(u64, f64)> = None;
        for (id, track) in &self.tracks {
            if track.camera_id != camera_id {
                continue;
            }
            let iou = overlap_ratio(&det.bbox, &track.bbox);
            let emb = match (self.config.embedding_threshold, &track.last_embedding) {
                (Some(_), Some(prev)) => embedding::cosine(&det.embedding, prev),
                _ => -1.0,
            };
            let eligible = iou >= self.config.iou_threshold
                || self
                    .config
                    .embedding_threshold
                    .is_some_and(|threshold| emb >= threshold);
            if !eligible {
                continue;
            }
            let score = 0.5 * iou + 0.5 * emb.max(0.0);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((*id, score));
            }
        }
        best.map(|(id, _)| id)
    }

    fn spawn(&mut self, camera_id: &str, bbox: [f64; 4], now: f64) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.tracks.insert(id, Track::new(id, camera_id, bbox, now));
        id
    }

    /// Feeds a quality-passing embedding into a track's window and emits
    /// a snapshot when the window matures.
    pub fn absorb(
        &mut self,
        track_id: u64,
        embedding: Vec<f32>,
        now: f64,
        window: &WindowConfig,
    ) -> Option<Snapshot> {
        let track = self.tracks.get_mut(&track_id)?;
        track.push_window(embedding, window.max_window);
        let matured =
            track.mature_window(now, window.min_window_frames, window.enqueue_interval)?;
        Some(Snapshot {
            camera_id: track.camera_id.clone(),
            track_id,
            embedding: matured,
            captured_at: now,
        })
    }

    /// Removes every track, on any camera, not seen within the TTL.
    /// Eviction is silent: no notification is emitted.
    pub fn evict_stale(&mut self, now: f64) -> usize {
        let before = self.tracks.len();
        let ttl = self.config.track_ttl;
        self.tracks.retain(|_, track| !track.is_stale(now, ttl));
        before - self.tracks.len()
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(bbox: [f64; 4], embedding: Vec<f32>) -> Detection {
        Detection {
            bbox,
            embedding,
            score: 0.9,
        }
    }

    fn iou_tracker() -> Tracker {
        Tracker::new(AssociationConfig::default())
    }

    fn hybrid_tracker() -> Tracker {
        Tracker::new(AssociationConfig {
            embedding_threshold: Some(0.6),
            ..AssociationConfig::default()
        })
    }

    const E_X: [f32; 2] = [1.0, 0.0];
    const E_Y: [f32; 2] = [0.0, 1.0];

    #[test]
    fn test_first_detection_creates_track() {
        let mut tracker = iou_tracker();
        let ids = tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);
        assert_eq!(ids, vec![1]);
        assert_eq!(tracker.len(), 1);
        let track = tracker.get(1).unwrap();
        assert_eq!(track.camera_id, "cam-01");
        assert_eq!(track.last_embedding.as_deref(), Some(&E_X[..]));
    }

    #[test]
    fn test_overlapping_detection_keeps_id() {
        let mut tracker = iou_tracker();
        tracker.assign("cam-01", &[det([10.0, 10.0, 60.0, 60.0], E_X.to_vec())], 0.0);
        let ids = tracker.assign("cam-01", &[det([12.0, 12.0, 62.0, 62.0], E_X.to_vec())], 0.1);
        assert_eq!(ids, vec![1]);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.get(1).unwrap().bbox, [12.0, 12.0, 62.0, 62.0]);
    }

    #[test]
    fn test_disjoint_detection_spawns_new_track() {
        let mut tracker = iou_tracker();
        tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);
        let ids = tracker.assign(
            "cam-01",
            &[det([200.0, 200.0, 250.0, 250.0], E_X.to_vec())],
            0.1,
        );
        assert_eq!(ids, vec![2]);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_track_ids_never_reused() {
        let mut tracker = iou_tracker();
        tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);
        tracker.evict_stale(100.0);
        let ids = tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 100.0);
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_same_box_other_camera_is_new_track() {
        let mut tracker = iou_tracker();
        tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);
        let ids = tracker.assign("cam-02", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_embedding_rescues_moved_face_when_enabled() {
        let mut tracker = hybrid_tracker();
        tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);
        // No box overlap, but the same identity embedding
        let ids = tracker.assign(
            "cam-01",
            &[det([300.0, 300.0, 350.0, 350.0], E_X.to_vec())],
            0.1,
        );
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_embedding_ignored_when_disabled() {
        let mut tracker = iou_tracker();
        tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);
        let ids = tracker.assign(
            "cam-01",
            &[det([300.0, 300.0, 350.0, 350.0], E_X.to_vec())],
            0.1,
        );
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_combined_score_prefers_better_overlap() {
        let mut tracker = iou_tracker();
        tracker.assign(
            "cam-01",
            &[
                det([0.0, 0.0, 50.0, 50.0], E_X.to_vec()),
                det([40.0, 0.0, 90.0, 50.0], E_Y.to_vec()),
            ],
            0.0,
        );
        // Nearly coincident with track 2's box
        let ids = tracker.assign("cam-01", &[det([42.0, 0.0, 92.0, 50.0], E_Y.to_vec())], 0.1);
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_later_detection_overwrites_earlier_assignment() {
        let mut tracker = iou_tracker();
        tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);
        // Both detections are eligible for track 1; the second one wins
        // and its box is what the track keeps.
        let ids = tracker.assign(
            "cam-01",
            &[
                det([1.0, 1.0, 51.0, 51.0], E_X.to_vec()),
                det([2.0, 2.0, 52.0, 52.0], E_X.to_vec()),
            ],
            0.1,
        );
        assert_eq!(ids, vec![1, 1]);
        assert_eq!(tracker.get(1).unwrap().bbox, [2.0, 2.0, 52.0, 52.0]);
    }

    #[test]
    fn test_identity_break_applied_on_assignment() {
        let mut tracker = iou_tracker();
        tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);
        tracker.get_mut(1).unwrap().record_label("alice");

        // Same box, orthogonal embedding: association holds via IOU but
        // the identity sub-state resets.
        tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_Y.to_vec())], 0.1);
        let track = tracker.get(1).unwrap();
        assert_eq!(track.confirm_hits, 0);
        assert_eq!(track.last_label, "unknown");
    }

    #[test]
    fn test_eviction_after_ttl() {
        let mut tracker = iou_tracker();
        tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);
        assert_eq!(tracker.evict_stale(1.0), 0);
        assert_eq!(tracker.evict_stale(1.6), 1);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_eviction_spans_cameras() {
        let mut tracker = iou_tracker();
        tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);
        tracker.assign("cam-02", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 1.0);
        assert_eq!(tracker.evict_stale(2.0), 1);
        assert!(tracker.get(2).is_some());
    }

    #[test]
    fn test_absorb_matures_after_min_frames() {
        let mut tracker = iou_tracker();
        let window = WindowConfig {
            max_window: 5,
            min_window_frames: 3,
            enqueue_interval: 0.0,
        };
        let ids = tracker.assign("cam-01", &[det([0.0, 0.0, 50.0, 50.0], E_X.to_vec())], 0.0);

        assert!(tracker.absorb(ids[0], E_X.to_vec(), 0.1, &window).is_none());
        assert!(tracker.absorb(ids[0], E_X.to_vec(), 0.2, &window).is_none());
        let snapshot = tracker.absorb(ids[0], E_X.to_vec(), 0.3, &window).unwrap();
        assert_eq!(snapshot.camera_id, "cam-01");
        assert_eq!(snapshot.track_id, ids[0]);
        assert!((snapshot.embedding[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_absorb_unknown_track_is_none() {
        let mut tracker = iou_tracker();
        assert!(tracker
            .absorb(42, E_X.to_vec(), 0.0, &WindowConfig::default())
            .is_none());
    }
}
