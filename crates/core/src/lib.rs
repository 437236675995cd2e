//! Face tracking, identity resolution, and notification dispatch.
//!
//! The library turns per-frame face detections from multiple camera sources
//! into deduplicated, identity-resolved events posted to a backend. Each
//! area is split into domain interfaces and infrastructure implementations;
//! `shared` holds the leaf geometry and pixel types, `pipeline` owns the
//! single-threaded per-tick orchestration.

pub mod detection;
pub mod dispatch;
pub mod pipeline;
pub mod recognition;
pub mod shared;
pub mod tracking;
