//! Mediated device (vGPU) discovery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  MdevLib                                                    │
//! │  ├── get_all_mediated_devices() - every vGPU instance       │
//! │  ├── get_all_parent_devices()   - GPUs offering vGPU types  │
//! │  └── get_mdev_bus_parents()     - parents the kernel lists  │
//! │                                                             │
//! │  MediatedDevice::resolve()                                  │
//! │  └── instance link -> backing dir -> type, driver, group    │
//! │                                                             │
//! │  ParentDevice::resolve()                                    │
//! │  └── PciLib lookup + mdev_supported_types scan              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Enumeration is fail-fast: one malformed instance or parent aborts the
//! call, since a half-consistent sysfs view cannot be trusted. Devices that
//! belong to another vendor are skipped without error.

mod device;
mod parent;

pub use device::MediatedDevice;
pub use parent::ParentDevice;

use crate::config::Config;
use crate::error::{Result, XdxError};
use crate::pci::{GpuEnumerator, PciLib};
use crate::sysfs;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

/// Type token inside an mdev type `name` attribute, e.g. "Type Name: xgv-1".
static TYPE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Type Name: (\S+)").expect("Invalid mdev type name regex"));

/// Extract the type token from the content of a `name` attribute.
pub(crate) fn parse_type_name(content: &str, path: &Path) -> Result<String> {
    TYPE_NAME_REGEX
        .captures(content.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            XdxError::parse(path, format!("unable to parse mdev type name {:?}", content.trim()))
        })
}

/// Sysfs-backed vGPU reader.
#[derive(Debug, Clone, Default)]
pub struct MdevLib {
    config: Config,
}

impl MdevLib {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Return every XDXCT vGPU instance on the system, ordered by UUID.
    pub fn get_all_mediated_devices(&self) -> Result<Vec<MediatedDevice>> {
        let root = &self.config.mdev_device_root;
        let mut devices = Vec::new();

        for uuid in sysfs::list_dir(root)? {
            let instance_path = root.join(&uuid);
            match MediatedDevice::resolve(&instance_path, &self.config) {
                Ok(Some(device)) => devices.push(device),
                Ok(None) => continue,
                Err(e) => {
                    warn!(uuid = %uuid, error = %e, "Failed to construct mdev device");
                    return Err(e);
                }
            }
        }

        info!(root = %root.display(), devices = devices.len(), "Enumerated mdev devices");
        Ok(devices)
    }

    /// Return every XDXCT GPU that offers at least one vGPU type.
    pub fn get_all_parent_devices(&self) -> Result<Vec<ParentDevice>> {
        let gpus = PciLib::from_config(&self.config).get_gpus()?;

        let mut parents = Vec::new();
        for gpu in gpus {
            if let Some(parent) = ParentDevice::resolve(&gpu.path, &self.config)? {
                parents.push(parent);
            }
        }

        info!(parents = parents.len(), "Enumerated mdev parent devices");
        Ok(parents)
    }

    /// Return the XDXCT parents registered on the kernel's mdev bus.
    ///
    /// The bus root only exists once an mdev-capable driver is loaded; a
    /// missing root yields an empty list.
    pub fn get_mdev_bus_parents(&self) -> Result<Vec<ParentDevice>> {
        let root = &self.config.mdev_bus_root;
        if !root.exists() {
            debug!(root = %root.display(), "mdev bus not present");
            return Ok(Vec::new());
        }

        let mut parents = Vec::new();
        for name in sysfs::list_dir(root)? {
            let device_path = sysfs::resolve(&root.join(&name))?;
            if let Some(parent) = ParentDevice::resolve(&device_path, &self.config)? {
                parents.push(parent);
            }
        }

        info!(root = %root.display(), parents = parents.len(), "Enumerated mdev bus parents");
        Ok(parents)
    }
}
