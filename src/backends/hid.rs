//! HID device session.
//!
//! [`HidSession`] owns at most one open `hidapi::HidDevice` handle and a
//! [`ReportDecoder`]. It is responsible for:
//! - opening a device by vendor/product pair, closing any prior handle first
//! - one bounded blocking read per [`read_event`](HidSession::read_event) call
//! - translating raw report bytes into a [`KeyEvent`] via the decoder
//! - closing the session on a failed read and surfacing `Disconnected`
//!
//! This module does **not**:
//! - retry or reconnect (that policy belongs to the session's owner)
//! - resolve key codes against the mapping table (dispatch loop's job)
//!
//! The handle is released whenever the session is closed, re-opened, or
//! dropped, so no exit path leaks an OS handle.

use hidapi::{HidApi, HidDevice};
use std::time::Duration;

use crate::error::DeviceError;
use crate::event::{FirstByteDecoder, KeyEvent, ReportDecoder, REPORT_LEN};
use crate::registry::UNKNOWN_DEVICE;
use crate::source::KeySource;

struct OpenHandle {
    raw: HidDevice,
    vendor_id: u16,
    product_id: u16,
}

/// An exclusive session on one physical HID device.
///
/// At most one handle is held at a time; `open` on an already-open session
/// closes the previous handle before acquiring the new one.
pub struct HidSession {
    handle: Option<OpenHandle>,
    decoder: Box<dyn ReportDecoder>,
    label: String,
    buf: [u8; REPORT_LEN],
}

impl HidSession {
    /// Create a closed session with the default [`FirstByteDecoder`].
    pub fn new() -> Self {
        Self::with_decoder(FirstByteDecoder)
    }

    /// Create a closed session with a custom report decoder.
    pub fn with_decoder(decoder: impl ReportDecoder + 'static) -> Self {
        Self {
            handle: None,
            decoder: Box::new(decoder),
            label: "closed".to_string(),
            buf: [0u8; REPORT_LEN],
        }
    }

    /// Open the device with the given vendor/product pair.
    ///
    /// Any previously held handle is released first. `NotFound` means the
    /// pair is absent from the bus; `AccessDenied` means the device exists
    /// but the OS refused the open (permissions, exclusive claim, ...).
    pub fn open(
        &mut self,
        api: &HidApi,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<(), DeviceError> {
        self.close();

        match api.open(vendor_id, product_id) {
            Ok(raw) => {
                let name = api
                    .device_list()
                    .find(|info| {
                        info.vendor_id() == vendor_id && info.product_id() == product_id
                    })
                    .and_then(|info| info.product_string())
                    .unwrap_or(UNKNOWN_DEVICE);
                self.label = format!("{name} [{vendor_id:04x}:{product_id:04x}]");
                self.handle = Some(OpenHandle {
                    raw,
                    vendor_id,
                    product_id,
                });
                log::info!("opened {}", self.label);
                Ok(())
            }
            Err(e) => {
                let present = api
                    .device_list()
                    .any(|info| info.vendor_id() == vendor_id && info.product_id() == product_id);
                if present {
                    log::error!(
                        "open refused for {vendor_id:04x}:{product_id:04x}: {e}"
                    );
                    Err(DeviceError::AccessDenied {
                        vendor_id,
                        product_id,
                        reason: e.to_string(),
                    })
                } else {
                    Err(DeviceError::NotFound {
                        vendor_id,
                        product_id,
                    })
                }
            }
        }
    }

    /// Release the OS handle. Safe to call on an already-closed session.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::info!(
                "closed device {:04x}:{:04x}",
                handle.vendor_id,
                handle.product_id
            );
        }
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

impl Default for HidSession {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for HidSession {
    /// Read one report, bounded by `timeout`.
    ///
    /// `Ok(None)` on timeout or when the decoder yields nothing. A read
    /// error closes the session and returns `Disconnected`; the caller
    /// decides whether to re-open.
    fn read_event(&mut self, timeout: Duration) -> Result<Option<KeyEvent>, DeviceError> {
        let Some(handle) = self.handle.as_ref() else {
            return Err(DeviceError::NotOpen);
        };

        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
        match handle.raw.read_timeout(&mut self.buf, timeout_ms) {
            // hidapi reports an elapsed timeout as a zero-length read.
            Ok(0) => Ok(None),
            Ok(n) => {
                let event = self.decoder.decode(&self.buf[..n]);
                if event.is_none() {
                    log::debug!("{}: report of {n} byte(s) carried no key event", self.label);
                }
                Ok(event)
            }
            Err(e) => {
                let reason = format!("{}: {e}", self.label);
                self.handle = None;
                log::error!("read failed, session closed: {reason}");
                Err(DeviceError::Disconnected { reason })
            }
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}
