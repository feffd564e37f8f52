//! Scripted key-event source.
//!
//! [`ScriptedSource`] replays a canned sequence of read outcomes through the
//! [`KeySource`] trait, so the dispatch loop can be exercised without
//! hardware. Each queued entry answers exactly one `read_event` call; an
//! exhausted script behaves like a device that never emits (every read
//! times out).

use std::collections::VecDeque;
use std::time::Duration;

use crate::error::DeviceError;
use crate::event::{FirstByteDecoder, KeyEvent, ReportDecoder, REPORT_LEN};
use crate::source::KeySource;

/// Outcome of one scripted read.
#[derive(Clone, Debug)]
pub enum ScriptedRead {
    /// A raw report arrives and is decoded normally.
    Report(Vec<u8>),
    /// The read times out with no event.
    Timeout,
    /// The device vanishes: the source closes and reports `Disconnected`.
    Disconnect,
}

/// In-memory [`KeySource`] fed with canned outcomes.
pub struct ScriptedSource {
    label: String,
    script: VecDeque<ScriptedRead>,
    decoder: Box<dyn ReportDecoder>,
    reads: usize,
    open: bool,
}

impl ScriptedSource {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            script: VecDeque::new(),
            decoder: Box::new(FirstByteDecoder),
            reads: 0,
            open: true,
        }
    }

    /// Queue one raw report.
    pub fn push_report(&mut self, report: &[u8]) {
        self.script.push_back(ScriptedRead::Report(report.to_vec()));
    }

    /// Queue a full-size report whose first byte is `code`, the shape a
    /// real device delivers.
    pub fn push_key(&mut self, code: u8) {
        let mut report = vec![0u8; REPORT_LEN];
        report[0] = code;
        self.script.push_back(ScriptedRead::Report(report));
    }

    pub fn push_timeout(&mut self) {
        self.script.push_back(ScriptedRead::Timeout);
    }

    pub fn push_disconnect(&mut self) {
        self.script.push_back(ScriptedRead::Disconnect);
    }

    /// Total `read_event` calls answered so far, including timeouts.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl KeySource for ScriptedSource {
    fn read_event(&mut self, _timeout: Duration) -> Result<Option<KeyEvent>, DeviceError> {
        if !self.open {
            return Err(DeviceError::NotOpen);
        }
        self.reads += 1;

        match self.script.pop_front() {
            Some(ScriptedRead::Report(report)) => Ok(self.decoder.decode(&report)),
            Some(ScriptedRead::Timeout) | None => Ok(None),
            Some(ScriptedRead::Disconnect) => {
                self.open = false;
                Err(DeviceError::Disconnected {
                    reason: format!("{}: scripted disconnect", self.label),
                })
            }
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_reports_in_order() {
        let mut src = ScriptedSource::new("scripted");
        src.push_key(4);
        src.push_timeout();
        src.push_key(7);

        let t = Duration::from_millis(1);
        assert_eq!(src.read_event(t).unwrap().unwrap().code, 4);
        assert!(src.read_event(t).unwrap().is_none());
        assert_eq!(src.read_event(t).unwrap().unwrap().code, 7);
        // Script exhausted: behaves like an idle device.
        assert!(src.read_event(t).unwrap().is_none());
        assert_eq!(src.reads(), 4);
    }

    #[test]
    fn disconnect_closes_the_source() {
        let mut src = ScriptedSource::new("scripted");
        src.push_disconnect();

        let t = Duration::from_millis(1);
        assert!(matches!(
            src.read_event(t),
            Err(DeviceError::Disconnected { .. })
        ));
        assert!(matches!(src.read_event(t), Err(DeviceError::NotOpen)));
    }
}
