use std::collections::VecDeque;

use crate::shared::constants::UNKNOWN_LABEL;
use crate::shared::embedding;

/// Per-object tracking state.
///
/// A track belongs to exactly one camera for its entire lifetime and its
/// id is never reused. Identity flows through two layers: the bounded
/// embedding window (raw per-frame identity signal) and the confirmation
/// counters (resolved-label streaks).
#[derive(Clone, Debug)]
pub struct Track {
    pub id: u64,
    pub camera_id: String,
    /// Last associated detection box.
    pub bbox: [f64; 4],
    /// Monotonic seconds of the last associated detection.
    pub last_seen: f64,
    window: VecDeque<Vec<f32>>,
    /// Most recent associated embedding, present after the first update.
    pub last_embedding: Option<Vec<f32>>,
    /// Monotonic seconds of the last window maturation.
    pub last_enqueued: f64,
    pub last_label: String,
    pub confirm_hits: u32,
}

impl Track {
    pub fn new(id: u64, camera_id: &str, bbox: [f64; 4], now: f64) -> Self {
        Self {
            id,
            camera_id: camera_id.to_string(),
            bbox,
            last_seen: now,
            window: VecDeque::new(),
            last_embedding: None,
            last_enqueued: 0.0,
            last_label: UNKNOWN_LABEL.to_string(),
            confirm_hits: 0,
        }
    }

    /// Positional update; runs for every associated detection, including
    /// ones the quality gate later rejects.
    pub fn mark_seen(&mut self, bbox: [f64; 4], now: f64) {
        self.bbox = bbox;
        self.last_seen = now;
    }

    /// Continuity check against the last stored embedding. An abrupt
    /// appearance change resets the identity sub-state so a stale
    /// confirmed label cannot survive under the same track id.
    ///
    /// Returns `true` when the identity was broken.
    pub fn check_identity_break(&mut self, embedding: &[f32], break_threshold: f64) -> bool {
        let Some(prev) = &self.last_embedding else {
            return false;
        };
        if embedding::cosine(embedding, prev) >= break_threshold {
            return false;
        }
        self.confirm_hits = 0;
        self.last_label = UNKNOWN_LABEL.to_string();
        true
    }

    pub fn remember_embedding(&mut self, embedding: Vec<f32>) {
        self.last_embedding = Some(embedding);
    }

    /// Appends to the bounded FIFO window, evicting the oldest entry on
    /// overflow.
    pub fn push_window(&mut self, embedding: Vec<f32>, max_window: usize) {
        self.window.push_back(embedding);
        while self.window.len() > max_window {
            self.window.pop_front();
        }
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Consumes the window when it has matured: enough frames collected
    /// and the enqueue interval elapsed. Emits the re-normalized mean and
    /// clears the window. A zero-norm mean leaves the window untouched
    /// and emits nothing.
    pub fn mature_window(
        &mut self,
        now: f64,
        min_window_frames: usize,
        enqueue_interval: f64,
    ) -> Option<Vec<f32>> {
        if self.window.len() < min_window_frames || now - self.last_enqueued < enqueue_interval {
            return None;
        }
        let vectors: Vec<&[f32]> = self.window.iter().map(|v| v.as_slice()).collect();
        let mean = embedding::mean_normalized(&vectors)?;
        self.window.clear();
        self.last_enqueued = now;
        Some(mean)
    }

    /// Advances the confirmation streak for a resolved label. A label
    /// change restarts the streak at 1.
    pub fn record_label(&mut self, label: &str) -> u32 {
        if label == self.last_label {
            self.confirm_hits += 1;
        } else {
            self.last_label = label.to_string();
            self.confirm_hits = 1;
        }
        self.confirm_hits
    }

    pub fn is_stale(&self, now: f64, ttl: f64) -> bool {
        now - self.last_seen > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn track() -> Track {
        Track::new(1, "cam-01", [0.0, 0.0, 10.0, 10.0], 0.0)
    }

    #[test]
    fn test_new_track_starts_unknown() {
        let t = track();
        assert_eq!(t.last_label, "unknown");
        assert_eq!(t.confirm_hits, 0);
        assert!(t.last_embedding.is_none());
        assert_eq!(t.window_len(), 0);
    }

    #[test]
    fn test_record_label_streak() {
        let mut t = track();
        for expected in 1..=4 {
            assert_eq!(t.record_label("alice"), expected);
        }
        assert_eq!(t.confirm_hits, 4);
    }

    #[test]
    fn test_record_label_flip_resets_to_one() {
        let mut t = track();
        t.record_label("alice");
        t.record_label("alice");
        assert_eq!(t.record_label("bob"), 1);
        assert_eq!(t.last_label, "bob");
    }

    #[test]
    fn test_identity_break_resets_state() {
        let mut t = track();
        t.remember_embedding(vec![1.0, 0.0]);
        t.record_label("alice");
        t.record_label("alice");

        assert!(t.check_identity_break(&[0.0, 1.0], 0.2));
        assert_eq!(t.confirm_hits, 0);
        assert_eq!(t.last_label, "unknown");
    }

    #[test]
    fn test_identity_break_noop_for_similar_embedding() {
        let mut t = track();
        t.remember_embedding(vec![1.0, 0.0]);
        t.record_label("alice");

        assert!(!t.check_identity_break(&[1.0, 0.0], 0.2));
        assert_eq!(t.confirm_hits, 1);
        assert_eq!(t.last_label, "alice");
    }

    #[test]
    fn test_identity_break_noop_without_stored_embedding() {
        let mut t = track();
        assert!(!t.check_identity_break(&[0.0, 1.0], 0.2));
    }

    #[test]
    fn test_window_bounded_fifo() {
        let mut t = track();
        for i in 0..7 {
            t.push_window(vec![i as f32, 0.0], 5);
        }
        assert_eq!(t.window_len(), 5);
        // Oldest two entries were evicted; remaining mean reflects 2..=6
        let snapshot = t.mature_window(10.0, 5, 0.0).unwrap();
        assert!(snapshot[0] > 0.99);
    }

    #[test]
    fn test_mature_requires_min_frames() {
        let mut t = track();
        t.push_window(vec![1.0, 0.0], 5);
        t.push_window(vec![1.0, 0.0], 5);
        assert!(t.mature_window(10.0, 3, 0.0).is_none());
        assert_eq!(t.window_len(), 2);
    }

    #[test]
    fn test_mature_requires_interval() {
        let mut t = track();
        for _ in 0..3 {
            t.push_window(vec![1.0, 0.0], 5);
        }
        t.last_enqueued = 9.5;
        assert!(t.mature_window(10.0, 3, 0.7).is_none());
        assert!(t.mature_window(10.3, 3, 0.7).is_some());
    }

    #[test]
    fn test_mature_emits_unit_vector_and_clears() {
        let mut t = track();
        t.push_window(vec![1.0, 0.0], 5);
        t.push_window(vec![0.0, 1.0], 5);
        t.push_window(vec![1.0, 0.0], 5);

        let snapshot = t.mature_window(2.0, 3, 0.7).unwrap();
        let norm: f64 = snapshot.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-6);
        assert_eq!(t.window_len(), 0);
        assert_relative_eq!(t.last_enqueued, 2.0);
    }

    #[test]
    fn test_mature_zero_norm_mean_emits_nothing() {
        let mut t = track();
        t.push_window(vec![1.0, 0.0], 5);
        t.push_window(vec![-1.0, 0.0], 5);
        assert!(t.mature_window(2.0, 2, 0.0).is_none());
        // Window untouched so a later frame can tip the balance
        assert_eq!(t.window_len(), 2);
        assert_relative_eq!(t.last_enqueued, 0.0);
    }

    #[test]
    fn test_staleness() {
        let mut t = track();
        t.mark_seen([0.0, 0.0, 10.0, 10.0], 5.0);
        assert!(!t.is_stale(6.0, 1.5));
        assert!(t.is_stale(6.6, 1.5));
    }
}
