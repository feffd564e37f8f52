use crate::dispatch::ActionHandler;
use crate::event::KeyEvent;

/// A handler that only logs what the dispatch loop resolves.
///
/// Useful as a dry-run consumer while building a mapping table, and as the
/// status/console projection for hosts that render a textual event log.
pub struct LogHandler;

impl LogHandler {
    pub fn new() -> Self {
        LogHandler
    }
}

impl Default for LogHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionHandler for LogHandler {
    fn on_action(&mut self, key: &str, action: &str) {
        log::info!("key {key} -> action {action}");
    }

    fn on_unmapped(&mut self, key: &str, event: &KeyEvent) {
        log::info!("key {key} (code {}) has no mapping", event.code);
    }
}
