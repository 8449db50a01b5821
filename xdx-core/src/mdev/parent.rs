//! mdev-capable parent GPUs.
//!
//! A parent is an XDXCT GPU that advertises at least one vGPU type under
//! `mdev_supported_types/`:
//!
//! ```text
//! 0000:01:00.0/mdev_supported_types/
//! ├── xgv-XGV_V0_1/
//! │   ├── name                  "Type Name: xgv-1"
//! │   └── available_instances   "4"
//! └── xgv-XGV_V0_2/
//!     └── ...
//! ```

use crate::config::Config;
use crate::error::{Result, XdxError};
use crate::mdev::parse_type_name;
use crate::pci::{PciDevice, PciLib};
use crate::sysfs;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An XDXCT GPU together with the vGPU types it can host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentDevice {
    #[serde(flatten)]
    pub device: PciDevice,
    /// mdev type name -> supported-type descriptor directory
    pub mdev_types: BTreeMap<String, PathBuf>,
}

impl ParentDevice {
    /// Build the parent for the PCI device directory at `device_path`.
    ///
    /// The directory's parent is used as the PCI root and its final segment
    /// as the PCI address. Returns `Ok(None)` when the device is not an
    /// XDXCT GPU or offers no vGPU types.
    pub fn resolve(device_path: &Path, config: &Config) -> Result<Option<Self>> {
        let Some(parent) = Self::resolve_owner(device_path, config)? else {
            return Ok(None);
        };
        if parent.mdev_types.is_empty() {
            debug!(address = %parent.device.address, "GPU offers no mdev types");
            return Ok(None);
        }
        Ok(Some(parent))
    }

    /// Like [`resolve`](Self::resolve), but keeps an XDXCT GPU whose type
    /// map is empty. `Ok(None)` only means the device belongs to another
    /// vendor or is not a display controller.
    pub(crate) fn resolve_owner(device_path: &Path, config: &Config) -> Result<Option<Self>> {
        let root = device_path
            .parent()
            .ok_or_else(|| XdxError::parse(device_path, "device path has no parent directory"))?;
        let address = sysfs::base_name(device_path)?;

        let pci = PciLib::from_config(config).with_root(root);
        let Some(device) = pci.get_gpu_by_pci_bus_id(&address)? else {
            debug!(path = %device_path.display(), "Not an XDXCT GPU, skipping");
            return Ok(None);
        };

        let mdev_types = read_supported_types(&device.path, &config.mdev_type_prefix)?;
        debug!(
            address = %device.address,
            mdev_types = ?mdev_types.keys().collect::<Vec<_>>(),
            "Resolved mdev parent"
        );

        Ok(Some(Self { device, mdev_types }))
    }

    pub fn address(&self) -> &str {
        &self.device.address
    }

    pub fn supports_mdev_type(&self, mdev_type: &str) -> bool {
        self.mdev_types.contains_key(mdev_type)
    }

    /// Descriptor directory of `mdev_type`, if this parent offers it.
    pub fn mdev_type_path(&self, mdev_type: &str) -> Option<&Path> {
        self.mdev_types.get(mdev_type).map(PathBuf::as_path)
    }

    /// Number of further instances of `mdev_type` this parent can create.
    pub fn available_instances(&self, mdev_type: &str) -> Result<u32> {
        let dir = self.mdev_type_path(mdev_type).ok_or_else(|| XdxError::UnsupportedMdevType {
            mdev_type: mdev_type.to_string(),
            parent: self.device.address.clone(),
        })?;
        sysfs::read_number(&dir.join("available_instances"))
    }
}

/// Map every `mdev_supported_types/<prefix>*` descriptor to its type name.
///
/// A descriptor whose `name` cannot be read or parsed aborts the whole scan.
fn read_supported_types(device_path: &Path, prefix: &str) -> Result<BTreeMap<String, PathBuf>> {
    let pattern = format!(
        "{}/mdev_supported_types/{}*/name",
        glob::Pattern::escape(&device_path.to_string_lossy()),
        glob::Pattern::escape(prefix)
    );
    let paths = glob::glob(&pattern).map_err(|e| {
        XdxError::parse(device_path, format!("invalid mdev type pattern {}: {}", pattern, e))
    })?;

    let mut mdev_types = BTreeMap::new();
    for entry in paths {
        let name_path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            XdxError::Io { path, source: io::Error::from(e) }
        })?;
        let content = sysfs::read_value(&name_path)?;
        let mdev_type = parse_type_name(&content, &name_path)?;
        let dir = name_path.parent().map(Path::to_path_buf).unwrap_or_default();
        mdev_types.insert(mdev_type, dir);
    }

    Ok(mdev_types)
}
