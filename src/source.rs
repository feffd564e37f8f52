//! The seam between the dispatch loop and a concrete key-event source.

use std::time::Duration;

use crate::error::DeviceError;
use crate::event::KeyEvent;

/// A source of decoded key events.
///
/// Implemented by [`HidSession`](crate::backends::hid::HidSession) for real
/// hardware and [`ScriptedSource`](crate::backends::scripted::ScriptedSource)
/// for tests and demos. The dispatch loop only ever sees this trait.
pub trait KeySource: Send {
    /// Blocking read of the next key event, bounded by `timeout`.
    ///
    /// `Ok(None)` means the timeout elapsed without an event; it is the
    /// caller's cancellation checkpoint, never an error. A `Disconnected`
    /// error is terminal for the source: further reads will not succeed
    /// until it is explicitly re-opened.
    fn read_event(&mut self, timeout: Duration) -> Result<Option<KeyEvent>, DeviceError>;

    /// Short human-readable label for log context.
    fn label(&self) -> &str;
}
