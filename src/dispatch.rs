//! The dispatch loop: pulls key events from a source, resolves them against
//! the mapping store, and hands the bound action to a handler.
//!
//! Two modes, never active at the same time against one source:
//! - **detection** ([`Dispatcher::detect_next_key`]): exactly one bounded
//!   read, used while the caller is capturing a new key to bind.
//! - **listening** ([`Dispatcher::run`] / [`Dispatcher::spawn`]): a
//!   cancellable loop that runs until stopped or until the source reports
//!   a disconnect.
//!
//! The loop blocks only inside the bounded `read_event`, so a raised stop
//! flag is observed within one timeout interval. Exclusivity of the two
//! modes is enforced by ownership: [`spawn`](Dispatcher::spawn) moves the
//! dispatcher into the listener thread, and [`ListenerHandle::join`] hands
//! it back for re-opening or further detection.
//!
//! A handler invocation that panics is caught and logged; it never takes
//! the loop down. A `Disconnected` error from the source ends the loop and
//! is surfaced to the owner exactly once; reconnection is an explicit new
//! open, never automatic.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::DeviceError;
use crate::event::{default_key_name, KeyEvent, KeyNamer};
use crate::mapping::MappingStore;
use crate::source::KeySource;

/// Default bound on each blocking read; also the cancellation latency.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Consumer of resolved key events.
///
/// The handler owns interpreting the action string (the dispatch loop never
/// does); slow work belongs on the handler's own thread, not in these
/// callbacks.
pub trait ActionHandler: Send {
    /// A mapped key fired. `action` is the opaque action string bound to
    /// `key` in the mapping store.
    fn on_action(&mut self, key: &str, action: &str);

    /// A key fired with no mapping. Observable, non-fatal.
    fn on_unmapped(&mut self, key: &str, event: &KeyEvent) {
        log::debug!("no action mapped for key {key} (code {})", event.code);
    }
}

impl ActionHandler for Box<dyn ActionHandler> {
    fn on_action(&mut self, key: &str, action: &str) {
        (**self).on_action(key, action);
    }

    fn on_unmapped(&mut self, key: &str, event: &KeyEvent) {
        (**self).on_unmapped(key, event);
    }
}

/// Shared stop signal for a running listener.
#[derive(Clone)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// Ask the listener to stop; observed at its next timeout boundary.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Binds a [`KeySource`], the [`MappingStore`], and a key namer into the
/// event-to-action pipeline.
pub struct Dispatcher<S: KeySource> {
    source: S,
    mappings: Arc<MappingStore>,
    namer: KeyNamer,
    poll_timeout: Duration,
    stop: Arc<AtomicBool>,
}

impl<S: KeySource> Dispatcher<S> {
    pub fn new(source: S, mappings: Arc<MappingStore>) -> Self {
        Self {
            source,
            mappings,
            namer: default_key_name,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the raw-code → canonical-key function.
    pub fn with_key_namer(mut self, namer: KeyNamer) -> Self {
        self.namer = namer;
        self
    }

    /// Bound each blocking read (and thus the cancellation latency).
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Access the source, e.g. to re-open it after a disconnect.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Stop signal shared with [`run`](Self::run); cloned handles reach
    /// other threads.
    pub fn stop_flag(&self) -> StopFlag {
        StopFlag(self.stop.clone())
    }

    /// Detection mode: exactly one bounded read, result returned directly.
    pub fn detect_next_key(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<KeyEvent>, DeviceError> {
        log::debug!("detection read on {}", self.source.label());
        self.source.read_event(timeout)
    }

    /// Listening mode: loop until the stop flag is raised (`Ok`) or the
    /// source fails (`Err`, terminal for this session).
    ///
    /// Events are delivered to `handler` in strict read order, one at a
    /// time; a timed-out read is the stop-flag checkpoint.
    pub fn run<H: ActionHandler + ?Sized>(
        &mut self,
        handler: &mut H,
    ) -> Result<(), DeviceError> {
        log::info!("listening on {}", self.source.label());
        loop {
            if self.stop.load(Ordering::SeqCst) {
                log::info!("listener stopped");
                return Ok(());
            }

            let event = match self.source.read_event(self.poll_timeout) {
                Ok(None) => continue,
                Ok(Some(event)) => event,
                Err(e) => {
                    log::error!("listener stopping: {e}");
                    return Err(e);
                }
            };

            let key = (self.namer)(event.code);
            match self.mappings.lookup(&key) {
                Some(action) => {
                    log::debug!("key {key} (code {}) -> {action}", event.code);
                    Self::shielded(&key, || handler.on_action(&key, &action));
                }
                None => {
                    Self::shielded(&key, || handler.on_unmapped(&key, &event));
                }
            }
        }
    }

    /// Run `f`, containing any panic so one bad handler invocation cannot
    /// take the listener down.
    fn shielded(key: &str, f: impl FnOnce()) {
        if catch_unwind(AssertUnwindSafe(f)).is_err() {
            log::error!("handler panicked on key {key}; listener continues");
        }
    }

    /// Move the dispatcher onto a dedicated listener thread.
    ///
    /// The returned handle stops and joins the thread; `join` hands the
    /// dispatcher back together with the loop's outcome.
    pub fn spawn<H>(mut self, mut handler: H) -> ListenerHandle<S>
    where
        S: 'static,
        H: ActionHandler + 'static,
    {
        self.stop.store(false, Ordering::SeqCst);
        let stop = self.stop.clone();
        let thread = thread::spawn(move || {
            let result = self.run(&mut handler);
            (self, result)
        });
        ListenerHandle { stop, thread }
    }
}

/// Handle on a spawned listener thread.
pub struct ListenerHandle<S: KeySource> {
    stop: Arc<AtomicBool>,
    thread: thread::JoinHandle<(Dispatcher<S>, Result<(), DeviceError>)>,
}

impl<S: KeySource> ListenerHandle<S> {
    /// Raise the stop flag; the loop exits at its next timeout boundary.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Wait for the loop to finish.
    ///
    /// Does not stop the loop by itself: call [`stop`](Self::stop) first
    /// for an explicit shutdown, or join directly to wait until the
    /// session ends on its own. `Ok(())` means an explicit stop;
    /// `Err(Disconnected)` means the session died and the owner must
    /// re-open before listening again.
    pub fn join(self) -> (Dispatcher<S>, Result<(), DeviceError>) {
        self.thread.join().expect("listener thread panicked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::scripted::ScriptedSource;
    use tempfile::tempdir;

    #[derive(Default)]
    struct Recording {
        actions: Vec<(String, String)>,
        unmapped: Vec<String>,
    }

    impl ActionHandler for Recording {
        fn on_action(&mut self, key: &str, action: &str) {
            self.actions.push((key.to_string(), action.to_string()));
        }

        fn on_unmapped(&mut self, key: &str, _event: &KeyEvent) {
            self.unmapped.push(key.to_string());
        }
    }

    fn store_with(dir: &tempfile::TempDir, entries: &[(&str, &str)]) -> Arc<MappingStore> {
        let store = MappingStore::open(dir.path().join("mappings.json")).unwrap();
        for (k, a) in entries {
            store.add(k, a).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn detection_returns_the_first_report_byte() {
        let dir = tempdir().unwrap();
        let mut src = ScriptedSource::new("pad");
        src.push_report(&[0x04, 0x00, 0x00]);
        src.push_timeout();

        let mut dispatcher = Dispatcher::new(src, store_with(&dir, &[]));
        let ev = dispatcher
            .detect_next_key(Duration::from_millis(10))
            .unwrap()
            .expect("event");
        assert_eq!(ev.code, 4);

        // Second detection hits the scripted timeout: no event, no error.
        assert!(dispatcher
            .detect_next_key(Duration::from_millis(10))
            .unwrap()
            .is_none());
    }

    #[test]
    fn listening_dispatches_mapped_keys_in_read_order() {
        let dir = tempdir().unwrap();
        let mut src = ScriptedSource::new("pad");
        for code in [4u8, 7, 4] {
            src.push_key(code);
        }
        src.push_disconnect();

        let mut dispatcher =
            Dispatcher::new(src, store_with(&dir, &[("K4", "play_track:t1")]));
        let mut handler = Recording::default();
        let result = dispatcher.run(&mut handler);

        assert!(matches!(result, Err(DeviceError::Disconnected { .. })));
        assert_eq!(
            handler.actions,
            vec![
                ("K4".to_string(), "play_track:t1".to_string()),
                ("K4".to_string(), "play_track:t1".to_string()),
            ]
        );
        // Code 7 produced a notification, never an action.
        assert_eq!(handler.unmapped, vec!["K7".to_string()]);
    }

    #[test]
    fn disconnect_stops_the_loop_with_no_further_reads() {
        let dir = tempdir().unwrap();
        let mut src = ScriptedSource::new("pad");
        src.push_key(4);
        src.push_disconnect();

        let mut dispatcher = Dispatcher::new(src, store_with(&dir, &[("K4", "pause")]));
        let mut handler = Recording::default();
        let result = dispatcher.run(&mut handler);

        assert!(matches!(result, Err(DeviceError::Disconnected { .. })));
        assert_eq!(handler.actions.len(), 1);
        // One read per scripted entry; nothing after the disconnect.
        assert_eq!(dispatcher.source_mut().reads(), 2);
    }

    #[test]
    fn stop_flag_halts_a_spawned_listener() {
        let dir = tempdir().unwrap();
        // Empty script: the source times out forever.
        let src = ScriptedSource::new("pad");
        let dispatcher = Dispatcher::new(src, store_with(&dir, &[]))
            .with_poll_timeout(Duration::from_millis(5));

        let handle = dispatcher.spawn(Recording::default());
        handle.stop();
        let (_dispatcher, result) = handle.join();
        assert!(result.is_ok());
    }

    #[test]
    fn handler_panic_does_not_kill_the_loop() {
        struct Flaky {
            calls: usize,
        }

        impl ActionHandler for Flaky {
            fn on_action(&mut self, _key: &str, _action: &str) {
                self.calls += 1;
                if self.calls == 1 {
                    panic!("bad handler");
                }
            }
        }

        let dir = tempdir().unwrap();
        let mut src = ScriptedSource::new("pad");
        src.push_key(4);
        src.push_key(4);
        src.push_disconnect();

        let mut dispatcher = Dispatcher::new(src, store_with(&dir, &[("K4", "resume")]));
        let mut handler = Flaky { calls: 0 };
        let result = dispatcher.run(&mut handler);

        assert!(matches!(result, Err(DeviceError::Disconnected { .. })));
        // The panicking first invocation did not suppress the second.
        assert_eq!(handler.calls, 2);
    }
}
