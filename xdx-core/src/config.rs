//! Configuration management.
//!
//! Every sysfs root the library reads from is a field here, so tests and
//! tools can point the readers at a fixture tree instead of the live host.

use crate::error::{Result, XdxError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default PCI device root.
pub const PCI_DEVICES_ROOT: &str = "/sys/bus/pci/devices";

/// Default root listing every mdev-capable parent device.
pub const MDEV_BUS_ROOT: &str = "/sys/class/mdev_bus";

/// Default root listing every mediated device instance.
pub const MDEV_DEVICE_ROOT: &str = "/sys/bus/mdev/devices";

/// PCI vendor ID of XDXCT.
pub const XDXCT_VENDOR_ID: u16 = 0x1eed;

/// Directory-name prefix of XDXCT vGPU type descriptors under
/// `mdev_supported_types/`.
pub const XDXCT_MDEV_TYPE_PREFIX: &str = "xgv-XGV_V0_";

/// Discovery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// PCI device root (default: `/sys/bus/pci/devices`)
    pub pci_devices_root: PathBuf,
    /// mdev parent registry (default: `/sys/class/mdev_bus`)
    pub mdev_bus_root: PathBuf,
    /// mdev instance root (default: `/sys/bus/mdev/devices`)
    pub mdev_device_root: PathBuf,
    /// Vendor ID a device must carry to be reported (default: `0x1eed`)
    pub vendor_id: u16,
    /// Prefix of supported-type descriptor directories (default: `xgv-XGV_V0_`)
    pub mdev_type_prefix: String,
    /// `pci.ids` database used to name devices (default: none)
    pub pci_ids_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pci_devices_root: PathBuf::from(PCI_DEVICES_ROOT),
            mdev_bus_root: PathBuf::from(MDEV_BUS_ROOT),
            mdev_device_root: PathBuf::from(MDEV_DEVICE_ROOT),
            vendor_id: XDXCT_VENDOR_ID,
            mdev_type_prefix: XDXCT_MDEV_TYPE_PREFIX.to_string(),
            pci_ids_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| XdxError::InvalidConfig {
            reason: format!("Failed to read config {}: {}", path.display(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| XdxError::InvalidConfig {
            reason: format!("Failed to parse config {}: {}", path.display(), e),
        })
    }

    /// Apply root overrides from the environment.
    ///
    /// Recognized variables: `XDX_PCI_DEVICES_ROOT`, `XDX_MDEV_BUS_ROOT`,
    /// `XDX_MDEV_DEVICE_ROOT`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("XDX_PCI_DEVICES_ROOT") {
            self.pci_devices_root = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("XDX_MDEV_BUS_ROOT") {
            self.mdev_bus_root = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("XDX_MDEV_DEVICE_ROOT") {
            self.mdev_device_root = PathBuf::from(dir);
        }
        self
    }

    /// Same configuration with a different PCI device root.
    pub fn with_pci_devices_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.pci_devices_root = root.into();
        self
    }

    /// Same configuration with a different mdev parent registry.
    pub fn with_mdev_bus_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.mdev_bus_root = root.into();
        self
    }

    /// Same configuration with a different mdev instance root.
    pub fn with_mdev_device_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.mdev_device_root = root.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.pci_devices_root, PathBuf::from("/sys/bus/pci/devices"));
        assert_eq!(config.mdev_bus_root, PathBuf::from("/sys/class/mdev_bus"));
        assert_eq!(config.mdev_device_root, PathBuf::from("/sys/bus/mdev/devices"));
        assert_eq!(config.vendor_id, 0x1eed);
        assert_eq!(config.mdev_type_prefix, "xgv-XGV_V0_");
        assert!(config.pci_ids_path.is_none());
    }

    #[test]
    fn test_config_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"pci_devices_root": "/tmp/fixture/pci"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.pci_devices_root, PathBuf::from("/tmp/fixture/pci"));
        assert_eq!(config.mdev_device_root, PathBuf::from(MDEV_DEVICE_ROOT));
    }

    #[test]
    fn test_config_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, XdxError::InvalidConfig { .. }));
    }

    #[test]
    fn test_config_builders() {
        let config = Config::default()
            .with_pci_devices_root("/a")
            .with_mdev_bus_root("/b")
            .with_mdev_device_root("/c");
        assert_eq!(config.pci_devices_root, PathBuf::from("/a"));
        assert_eq!(config.mdev_bus_root, PathBuf::from("/b"));
        assert_eq!(config.mdev_device_root, PathBuf::from("/c"));
    }
}
