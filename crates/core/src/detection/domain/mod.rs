pub mod face_detector;
pub mod frame_source;
pub mod quality_gate;
