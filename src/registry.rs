//! Device discovery.
//!
//! [`DeviceRegistry`] owns the `hidapi` context and produces
//! [`DeviceDescriptor`] snapshots of every HID interface currently on the
//! bus. A descriptor identifies a *candidate* device, never a connection;
//! opening happens through [`DeviceRegistry::open`] or
//! [`HidSession::open`](crate::backends::hid::HidSession::open).

use hidapi::HidApi;
use serde::Serialize;
use std::fmt;

use crate::backends::hid::HidSession;
use crate::error::DeviceError;

/// Display name used when a device reports no product string.
pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Immutable snapshot of one enumerated HID interface.
#[derive(Clone, Debug, Serialize)]
pub struct DeviceDescriptor {
    /// USB Vendor ID (VID).
    pub vendor_id: u16,
    /// USB Product ID (PID).
    pub product_id: u16,
    /// Friendly product string, or [`UNKNOWN_DEVICE`] when the device
    /// reports none.
    pub display_name: String,
    /// Firmware serial number, when present.
    pub serial_number: Option<String>,
    /// OS/topology path. Opaque, diagnostic first, identity second.
    pub path: String,
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:04x}:{:04x}]",
            self.display_name, self.vendor_id, self.product_id
        )
    }
}

/// Owns the HID context and enumerates candidate devices.
pub struct DeviceRegistry {
    api: HidApi,
}

impl DeviceRegistry {
    /// Initialize the HID context.
    pub fn new() -> Result<Self, DeviceError> {
        let api = HidApi::new().map_err(|e| DeviceError::Init {
            reason: e.to_string(),
        })?;
        Ok(Self { api })
    }

    /// Re-scan the bus and list every HID interface present.
    ///
    /// Returns an empty vec (not an error) when nothing is connected. The
    /// result is sorted by (vendor_id, product_id, path) so an unchanged
    /// physical topology yields the same order across calls.
    pub fn enumerate(&mut self) -> Vec<DeviceDescriptor> {
        if let Err(e) = self.api.refresh_devices() {
            // Stale list is still usable; the next refresh may recover.
            log::warn!("device re-scan failed, using cached list: {e}");
        }

        let mut found: Vec<DeviceDescriptor> = self
            .api
            .device_list()
            .map(|info| DeviceDescriptor {
                vendor_id: info.vendor_id(),
                product_id: info.product_id(),
                display_name: info
                    .product_string()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(UNKNOWN_DEVICE)
                    .to_string(),
                serial_number: info.serial_number().map(|s| s.to_string()),
                path: info.path().to_string_lossy().to_string(),
            })
            .collect();

        found.sort_by(|a, b| {
            (a.vendor_id, a.product_id, &a.path).cmp(&(b.vendor_id, b.product_id, &b.path))
        });

        log::debug!("enumerated {} HID interface(s)", found.len());
        found
    }

    /// Open a session on the given vendor/product pair.
    pub fn open(&self, vendor_id: u16, product_id: u16) -> Result<HidSession, DeviceError> {
        let mut session = HidSession::new();
        session.open(&self.api, vendor_id, product_id)?;
        Ok(session)
    }

    /// Borrow the underlying HID context, e.g. to re-open an existing
    /// [`HidSession`] after a disconnect.
    pub fn api(&self) -> &HidApi {
        &self.api
    }
}
