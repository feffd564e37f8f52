//! App settings.
//!
//! Loaded from a TOML file (default: `<config_dir>/keycue/settings.toml`).
//! Every field is optional; a missing file means defaults. Example:
//!
//! ```toml
//! mappings = "/home/user/.config/keycue/mappings.json"
//! read_timeout_ms = 100
//!
//! [device]
//! vendor_id = 0x05f3
//! product_id = 0x030c
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dispatch::DEFAULT_POLL_TIMEOUT;
use crate::error::PersistError;

/// Preferred device to open at startup.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct DevicePreference {
    pub vendor_id: u16,
    pub product_id: u16,
}

/// User-configurable settings with defaults for everything.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    mappings: Option<PathBuf>,

    #[serde(default)]
    read_timeout_ms: Option<u64>,

    #[serde(default)]
    device: Option<DevicePreference>,
}

impl Settings {
    /// Load from the default path; a missing file (or no resolvable config
    /// directory) yields defaults.
    pub fn load_default() -> Result<Self, PersistError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PersistError::io(path, e))?;
        Self::parse(&content, path)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, PersistError> {
        Self::parse(content, Path::new("<inline settings>"))
    }

    fn parse(content: &str, origin: &Path) -> Result<Self, PersistError> {
        toml::from_str(content).map_err(|e| PersistError::malformed(origin, e.message()))
    }

    /// `<config_dir>/keycue/settings.toml`, when a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("keycue").join("settings.toml"))
    }

    /// Where the mapping table lives.
    pub fn mappings_path(&self) -> PathBuf {
        self.mappings.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .map(|p| p.join("keycue").join("mappings.json"))
                .unwrap_or_else(|| PathBuf::from("mappings.json"))
        })
    }

    /// Bound for each blocking device read.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_TIMEOUT)
    }

    /// Device to open at startup, when configured.
    pub fn device(&self) -> Option<DevicePreference> {
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_settings_parse() {
        let settings = Settings::from_toml(
            r#"
            mappings = "/tmp/maps.json"
            read_timeout_ms = 250

            [device]
            vendor_id = 0x05f3
            product_id = 0x030c
            "#,
        )
        .unwrap();

        assert_eq!(settings.mappings_path(), PathBuf::from("/tmp/maps.json"));
        assert_eq!(settings.read_timeout(), Duration::from_millis(250));
        let dev = settings.device().expect("device preference");
        assert_eq!((dev.vendor_id, dev.product_id), (0x05f3, 0x030c));
    }

    #[test]
    fn empty_settings_fall_back_to_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.read_timeout(), DEFAULT_POLL_TIMEOUT);
        assert!(settings.device().is_none());
        assert!(settings.mappings_path().ends_with("mappings.json"));
    }

    #[test]
    fn malformed_toml_is_reported() {
        assert!(matches!(
            Settings::from_toml("read_timeout_ms = \"soon\""),
            Err(PersistError::Malformed { .. })
        ));
    }
}
