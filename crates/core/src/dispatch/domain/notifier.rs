use crate::dispatch::event::Event;

/// Outbound transport for dispatched events.
///
/// One attempt per event: the engine logs failures and moves on, and the
/// cooldown window is consumed whether or not the attempt succeeded.
pub trait Notifier: Send {
    fn notify(&mut self, event: &Event) -> Result<(), Box<dyn std::error::Error>>;
}
