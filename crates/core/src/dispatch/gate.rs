use std::collections::HashMap;

use crate::dispatch::event::Event;
use crate::recognition::matcher::Resolution;
use crate::shared::constants::{NEUTRAL_MOOD, UNKNOWN_LABEL};
use crate::tracking::track::Track;

#[derive(Clone, Debug)]
pub struct GateConfig {
    /// Consecutive identical resolutions required before dispatch.
    pub min_confirm_hits: u32,
    /// Minimum seconds between dispatches for one camera+identity pair.
    pub cooldown_seconds: f64,
    /// Dispatch "unknown" resolutions instead of discarding them.
    pub send_unknown: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_confirm_hits: 1,
            cooldown_seconds: 3.0,
            send_unknown: false,
        }
    }
}

/// Confirmation and cooldown gate: turns resolved labels into at most
/// one dispatchable event per eligible maturation.
///
/// The cooldown timestamp is recorded when an event is produced, before
/// any transport attempt, so failed sends still consume the window and
/// are never retried.
pub struct DispatchGate {
    config: GateConfig,
    last_sent: HashMap<String, f64>,
}

impl DispatchGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            last_sent: HashMap::new(),
        }
    }

    /// Runs one resolved label through confirmation and cooldown.
    /// Returns the event to send, or `None` when the resolution was
    /// discarded, unconfirmed, or cooling down.
    pub fn process(&mut self, track: &mut Track, resolution: &Resolution, now: f64) -> Option<Event> {
        if resolution.label == UNKNOWN_LABEL && !self.config.send_unknown {
            log::debug!(
                "[{}] match=unknown score={:.3} (skipped)",
                track.camera_id,
                resolution.score
            );
            return None;
        }

        let hits = track.record_label(&resolution.label);
        if hits < self.config.min_confirm_hits {
            return None;
        }

        let key = format!("{}:{}", track.camera_id, resolution.label);
        if let Some(&sent_at) = self.last_sent.get(&key) {
            if now - sent_at < self.config.cooldown_seconds {
                return None;
            }
        }
        self.last_sent.insert(key, now);
        Some(Event::now(&resolution.label, NEUTRAL_MOOD, &track.camera_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(camera_id: &str) -> Track {
        Track::new(1, camera_id, [0.0, 0.0, 10.0, 10.0], 0.0)
    }

    fn resolution(label: &str) -> Resolution {
        Resolution {
            label: label.to_string(),
            score: 0.8,
        }
    }

    fn gate(min_confirm_hits: u32, cooldown_seconds: f64, send_unknown: bool) -> DispatchGate {
        DispatchGate::new(GateConfig {
            min_confirm_hits,
            cooldown_seconds,
            send_unknown,
        })
    }

    #[test]
    fn test_unknown_discarded_without_state_change() {
        let mut gate = gate(1, 3.0, false);
        let mut t = track("cam-01");
        t.record_label("alice");

        assert!(gate.process(&mut t, &resolution("unknown"), 1.0).is_none());
        // Confirmation state untouched by a discarded resolution
        assert_eq!(t.last_label, "alice");
        assert_eq!(t.confirm_hits, 1);
    }

    #[test]
    fn test_unknown_dispatched_when_opted_in() {
        let mut gate = gate(1, 3.0, true);
        let mut t = track("cam-01");
        let event = gate.process(&mut t, &resolution("unknown"), 1.0).unwrap();
        assert_eq!(event.name, "unknown");
        assert_eq!(event.camera_id, "cam-01");
    }

    #[test]
    fn test_confirmation_requires_streak() {
        let mut gate = gate(3, 0.0, false);
        let mut t = track("cam-01");

        assert!(gate.process(&mut t, &resolution("alice"), 1.0).is_none());
        assert!(gate.process(&mut t, &resolution("alice"), 2.0).is_none());
        assert!(gate.process(&mut t, &resolution("alice"), 3.0).is_some());
        assert_eq!(t.confirm_hits, 3);
    }

    #[test]
    fn test_label_flip_restarts_streak() {
        let mut gate = gate(2, 0.0, false);
        let mut t = track("cam-01");

        gate.process(&mut t, &resolution("alice"), 1.0);
        assert!(gate.process(&mut t, &resolution("bob"), 2.0).is_none());
        assert_eq!(t.confirm_hits, 1);
        assert!(gate.process(&mut t, &resolution("bob"), 3.0).is_some());
    }

    #[test]
    fn test_cooldown_suppresses_second_dispatch() {
        let mut gate = gate(1, 3.0, false);
        let mut t = track("cam-01");

        assert!(gate.process(&mut t, &resolution("alice"), 1.0).is_some());
        assert!(gate.process(&mut t, &resolution("alice"), 2.5).is_none());
        assert!(gate.process(&mut t, &resolution("alice"), 4.1).is_some());
    }

    #[test]
    fn test_suppressed_dispatch_does_not_extend_cooldown() {
        let mut gate = gate(1, 3.0, false);
        let mut t = track("cam-01");

        gate.process(&mut t, &resolution("alice"), 1.0);
        // Suppressed at 3.5; the window still ends at 4.0
        assert!(gate.process(&mut t, &resolution("alice"), 3.5).is_none());
        assert!(gate.process(&mut t, &resolution("alice"), 4.1).is_some());
    }

    #[test]
    fn test_cooldown_keys_are_per_camera() {
        let mut gate = gate(1, 3.0, false);
        let mut a = track("cam-01");
        let mut b = track("cam-02");

        assert!(gate.process(&mut a, &resolution("alice"), 1.0).is_some());
        assert!(gate.process(&mut b, &resolution("alice"), 1.0).is_some());
    }

    #[test]
    fn test_cooldown_keys_are_per_label() {
        let mut gate = gate(1, 3.0, false);
        let mut t = track("cam-01");

        assert!(gate.process(&mut t, &resolution("alice"), 1.0).is_some());
        // Different identity on the same camera dispatches immediately
        assert!(gate.process(&mut t, &resolution("bob"), 1.1).is_some());
    }

    #[test]
    fn test_event_carries_neutral_mood() {
        let mut gate = gate(1, 3.0, false);
        let mut t = track("cam-01");
        let event = gate.process(&mut t, &resolution("alice"), 1.0).unwrap();
        assert_eq!(event.mood, "neutral");
    }
}
