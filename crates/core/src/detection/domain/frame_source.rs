use crate::shared::frame::Frame;

/// Domain interface for one camera's frame stream.
///
/// The engine calls `connect` at startup and again after every failed
/// `read`; sources own their reconnect bookkeeping.
pub trait FrameSource: Send {
    /// (Re)establish the underlying stream. Returns `false` when the
    /// source is unavailable.
    fn connect(&mut self) -> bool;

    /// Next frame, or `None` when the read failed or the stream is
    /// exhausted.
    fn read(&mut self) -> Option<Frame>;

    /// Release any held resources. Default: no-op.
    fn release(&mut self) {}
}
