use crate::detection::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;

/// One camera's connection state plus the frame counter driving the
/// stride sampling policy.
pub struct Camera {
    id: String,
    source: Box<dyn FrameSource>,
    frame_no: u64,
}

impl Camera {
    pub fn new(id: &str, source: Box<dyn FrameSource>) -> Self {
        Self {
            id: id.to_string(),
            source,
            frame_no: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Frames read so far; the stride policy keys off this counter.
    pub fn frame_no(&self) -> u64 {
        self.frame_no
    }

    pub fn connect(&mut self) -> bool {
        let ok = self.source.connect();
        if ok {
            log::info!("[{}] stream connected", self.id);
        }
        ok
    }

    /// One frame, or `None` after a failed read. A failed read triggers
    /// an immediate reconnect attempt; this tick's contribution from the
    /// camera is skipped either way.
    pub fn read(&mut self) -> Option<Frame> {
        match self.source.read() {
            Some(frame) => {
                self.frame_no += 1;
                Some(frame)
            }
            None => {
                log::warn!("[{}] frame read failed, reconnecting", self.id);
                self.connect();
                None
            }
        }
    }

    pub fn release(&mut self) {
        self.source.release();
    }
}
