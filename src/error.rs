//! Error taxonomy.
//!
//! Two families: [`DeviceError`] for everything touching the HID bus, and
//! [`PersistError`] for the on-disk mapping table and settings file.
//!
//! A read that simply times out is **not** an error anywhere in this crate;
//! it is modeled as `Ok(None)` from [`KeySource::read_event`](crate::source::KeySource::read_event).
//! Likewise, removing or looking up an absent mapping key is a normal empty
//! result, not an error.

use std::path::PathBuf;

/// Failures while enumerating, opening, or reading an input device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The vendor/product pair is not present on the bus.
    #[error("device {vendor_id:04x}:{product_id:04x} not found")]
    NotFound { vendor_id: u16, product_id: u16 },

    /// The device exists but the OS refused to open it (permissions,
    /// exclusive claim by another process, ...).
    #[error("access to device {vendor_id:04x}:{product_id:04x} denied: {reason}")]
    AccessDenied {
        vendor_id: u16,
        product_id: u16,
        reason: String,
    },

    /// A read failed mid-session. The session is closed when this is
    /// returned; reconnecting requires an explicit new open.
    #[error("device disconnected during read: {reason}")]
    Disconnected { reason: String },

    /// A read was attempted against a session with no open handle.
    #[error("no device is open")]
    NotOpen,

    /// The HID context itself could not be initialized.
    #[error("hid subsystem initialization failed: {reason}")]
    Init { reason: String },
}

/// Failures while loading or saving a persisted file (mapping table,
/// settings).
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data in {path}: {detail}")]
    Malformed { path: PathBuf, detail: String },
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Self::Malformed {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}
