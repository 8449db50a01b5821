//! XDXCT GPU enumeration over the PCI sysfs tree.
//!
//! Each device directory under the PCI root (`/sys/bus/pci/devices` by
//! default) is read into a [`PciDevice`] snapshot. Only display-class
//! functions of the configured vendor are reported; every other device is
//! silently skipped.
//!
//! ```text
//! /sys/bus/pci/devices/0000:01:00.0/
//! ├── vendor        0x1eed
//! ├── class         0x030000
//! ├── device        0x1330
//! ├── numa_node     -1
//! ├── driver        -> ../../../bus/pci/drivers/xgv
//! ├── iommu_group   -> ../../../kernel/iommu_groups/12
//! └── physfn        -> ../0000:00:01.0   (SR-IOV virtual functions only)
//! ```

mod device;
pub mod names;

pub use device::{class, is_valid_pci_address, PciDevice};
pub use names::PciIds;

use crate::config::{Config, PCI_DEVICES_ROOT, XDXCT_VENDOR_ID};
use crate::error::{Result, XdxError};
use crate::sysfs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source of XDXCT GPU snapshots.
///
/// [`PciLib`] reads them from sysfs; tests can substitute fixed devices.
pub trait GpuEnumerator {
    /// Return all GPUs, ordered by PCI address.
    fn get_gpus(&self) -> Result<Vec<PciDevice>>;

    /// Return the GPU at position `index` of [`get_gpus`](Self::get_gpus).
    fn get_gpu_by_index(&self, index: usize) -> Result<PciDevice> {
        let mut gpus = self.get_gpus()?;
        if index >= gpus.len() {
            return Err(XdxError::IndexOutOfRange { index, len: gpus.len() });
        }
        Ok(gpus.swap_remove(index))
    }

    /// Return the GPU with the given PCI address.
    fn get_gpu_by_address(&self, address: &str) -> Result<PciDevice> {
        if !is_valid_pci_address(address) {
            return Err(XdxError::InvalidPciAddress { address: address.to_string() });
        }
        self.get_gpus()?
            .into_iter()
            .find(|gpu| gpu.address == address)
            .ok_or_else(|| device::not_found(address))
    }
}

/// Sysfs-backed GPU reader.
#[derive(Debug, Clone)]
pub struct PciLib {
    root: PathBuf,
    vendor_id: u16,
    pci_ids_path: Option<PathBuf>,
}

impl Default for PciLib {
    fn default() -> Self {
        Self::new(PCI_DEVICES_ROOT)
    }
}

impl PciLib {
    /// Reader for XDXCT GPUs under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), vendor_id: XDXCT_VENDOR_ID, pci_ids_path: None }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.pci_devices_root.clone(),
            vendor_id: config.vendor_id,
            pci_ids_path: config.pci_ids_path.clone(),
        }
    }

    /// Same reader with a different PCI root.
    pub fn with_root(&self, root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ..self.clone() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    /// Look up one device by PCI bus ID.
    ///
    /// `Ok(None)` means the device exists but is not a GPU of our vendor;
    /// I/O and parse failures are errors.
    pub fn get_gpu_by_pci_bus_id(&self, address: &str) -> Result<Option<PciDevice>> {
        let ids = self.load_ids()?;
        PciDevice::from_sysfs(&self.root, address, self.vendor_id, ids.as_ref())
    }

    fn load_ids(&self) -> Result<Option<PciIds>> {
        self.pci_ids_path.as_deref().map(|path| PciIds::load(path, self.vendor_id)).transpose()
    }
}

impl GpuEnumerator for PciLib {
    fn get_gpus(&self) -> Result<Vec<PciDevice>> {
        let addresses: Vec<String> = sysfs::list_dir(&self.root)?
            .into_iter()
            .filter(|entry| {
                let valid = is_valid_pci_address(entry);
                if !valid {
                    debug!(entry = %entry, "Skipping non-PCI entry");
                }
                valid
            })
            .collect();

        let ids = self.load_ids()?;
        let mut gpus = Vec::new();
        for address in &addresses {
            let gpu = PciDevice::from_sysfs(&self.root, address, self.vendor_id, ids.as_ref())?;
            if let Some(gpu) = gpu {
                gpus.push(gpu);
            }
        }

        info!(
            root = %self.root.display(),
            scanned = addresses.len(),
            gpus = gpus.len(),
            "Enumerated XDXCT GPUs"
        );

        Ok(gpus)
    }

    fn get_gpu_by_address(&self, address: &str) -> Result<PciDevice> {
        if !is_valid_pci_address(address) {
            return Err(XdxError::InvalidPciAddress { address: address.to_string() });
        }
        if !self.root.join(address).exists() {
            return Err(device::not_found(address));
        }
        self.get_gpu_by_pci_bus_id(address)?.ok_or_else(|| device::not_found(address))
    }
}
