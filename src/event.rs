//! Key events and raw-report decoding.
//!
//! A [`KeyEvent`] is one discrete input occurrence decoded from a single raw
//! HID input report. Events are ephemeral: produced per read, consumed
//! immediately by the dispatch loop, never retained.
//!
//! ## Decoding convention
//! Reports are decoded by a [`ReportDecoder`] owned by the session. The
//! default, [`FirstByteDecoder`], treats the **first byte of the report as
//! the key code** and ignores the rest.
//!
//! This is a deliberate simplification, not the true wire format of
//! composite multi-key HID devices (a boot keyboard, for example, carries a
//! modifier byte followed by up to six usage codes). It is kept because the
//! devices this crate targets emit one key per report, and it is kept
//! **replaceable**: inject a different decoder through
//! [`HidSession::with_decoder`](crate::backends::hid::HidSession::with_decoder)
//! when a real report layout is known.

/// Fixed size of one raw input report in the reference protocol. A single
/// read drains at most one report of this size.
pub const REPORT_LEN: usize = 64;

/// One decoded key occurrence.
///
/// `report` carries the raw bytes of the originating report (at most one
/// 64-byte report per event) so richer decoders and diagnostics can see
/// everything the device sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// Decoded key code.
    pub code: u8,
    /// The raw report bytes this event was decoded from.
    pub report: Vec<u8>,
}

/// Strategy turning one raw input report into at most one [`KeyEvent`].
///
/// Returning `None` means the report carried no key occurrence; the session
/// treats that the same as a timed-out read.
pub trait ReportDecoder: Send {
    fn decode(&self, report: &[u8]) -> Option<KeyEvent>;
}

/// Default decoder: first report byte is the key code.
///
/// See the module docs for why this simplification exists and how to
/// replace it.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstByteDecoder;

impl ReportDecoder for FirstByteDecoder {
    fn decode(&self, report: &[u8]) -> Option<KeyEvent> {
        let code = *report.first()?;
        Some(KeyEvent {
            code,
            report: report.to_vec(),
        })
    }
}

/// Pure function mapping a raw key code to its canonical key identifier.
///
/// The canonical identifier, not the raw code, is what the mapping table is
/// keyed by, so tables survive a decoder swap as long as the namer is kept.
pub type KeyNamer = fn(u8) -> String;

/// Default canonical naming: code `4` becomes `"K4"`.
pub fn default_key_name(code: u8) -> String {
    format!("K{code}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_byte_decoder_uses_leading_byte() {
        let report = [0x04u8, 0xaa, 0xbb, 0x00];
        let ev = FirstByteDecoder.decode(&report).expect("event");
        assert_eq!(ev.code, 4);
        assert_eq!(ev.report, report.to_vec());
    }

    #[test]
    fn first_byte_decoder_ignores_empty_reports() {
        assert!(FirstByteDecoder.decode(&[]).is_none());
    }

    #[test]
    fn default_key_names_are_stable() {
        assert_eq!(default_key_name(4), "K4");
        assert_eq!(default_key_name(255), "K255");
    }
}
