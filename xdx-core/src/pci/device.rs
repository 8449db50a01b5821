//! PCI device snapshot read from sysfs.

use crate::error::{Result, XdxError};
use crate::pci::names::{self, PciIds};
use crate::sysfs;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Regular expression to validate PCI address format: 0000:01:00.0
static PCI_ADDRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{4}:[0-9a-fA-F]{2}:[0-9a-fA-F]{2}\.[0-7]$")
        .expect("Invalid PCI address regex")
});

/// PCI class codes, as the 24-bit `class` attribute exposes them.
pub mod class {
    /// Display controller base class (0x03xxxx)
    pub const DISPLAY_BASE: u32 = 0x03;
    /// VGA compatible controller (0x030000)
    pub const VGA_CONTROLLER: u32 = 0x030000;
    /// 3D controller (0x030200)
    pub const CONTROLLER_3D: u32 = 0x030200;
    /// Display controller (0x038000)
    pub const DISPLAY_CONTROLLER: u32 = 0x038000;

    /// Base class (bits 23..16) of a class code.
    pub fn base(class: u32) -> u32 {
        (class >> 16) & 0xff
    }

    /// Base class and subclass (bits 23..8) of a class code.
    pub fn subclass(class: u32) -> u32 {
        (class >> 8) & 0xffff
    }
}

/// PCI device information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PciDevice {
    /// Sysfs path to this device
    pub path: PathBuf,
    /// PCI address (e.g., "0000:01:00.0")
    pub address: String,
    /// Vendor ID (0x1eed for XDXCT)
    pub vendor: u16,
    /// Class code (e.g., 0x030000 for VGA)
    pub class: u32,
    pub class_name: String,
    /// Device ID
    pub device: u16,
    pub device_name: String,
    /// Current driver (None if unbound)
    pub driver: Option<String>,
    /// IOMMU group ID (None if IOMMU is disabled)
    pub iommu_group: Option<u32>,
    /// NUMA node (-1 if not applicable)
    pub numa_node: i32,
    /// Is this an SR-IOV virtual function?
    pub is_vf: bool,
}

impl PciDevice {
    /// Read the device at `root/address`.
    ///
    /// Returns `Ok(None)` when the device is not a display controller made
    /// by `vendor_id`. `vendor` is read first so foreign devices are rejected
    /// without touching any other attribute.
    pub fn from_sysfs(
        root: &Path,
        address: &str,
        vendor_id: u16,
        ids: Option<&PciIds>,
    ) -> Result<Option<Self>> {
        let path = root.join(address);

        let vendor: u16 = sysfs::read_number(&path.join("vendor"))?;
        if vendor != vendor_id {
            return Ok(None);
        }

        let class: u32 = sysfs::read_number(&path.join("class"))?;
        if class::base(class) != class::DISPLAY_BASE {
            debug!(
                address = %address,
                class = %format!("{:#08x}", class),
                "Skipping non-display function"
            );
            return Ok(None);
        }

        let device: u16 = sysfs::read_number(&path.join("device"))?;
        let driver = read_driver(&path)?;
        let iommu_group = read_iommu_group(&path)?;
        let numa_node = read_numa_node(&path)?;
        let is_vf = sysfs::resolve_optional(&path.join("physfn"))?.is_some();

        let class_name = names::class_name(class).to_string();
        let device_name = ids
            .and_then(|ids| ids.device_name(device))
            .unwrap_or(names::UNKNOWN_DEVICE)
            .to_string();

        debug!(
            address = %address,
            vendor = %format!("{:04x}", vendor),
            device = %format!("{:04x}", device),
            driver = ?driver,
            iommu_group = ?iommu_group,
            numa_node = %numa_node,
            is_vf = %is_vf,
            "Read PCI device info"
        );

        Ok(Some(Self {
            path,
            address: address.to_string(),
            vendor,
            class,
            class_name,
            device,
            device_name,
            driver,
            iommu_group,
            numa_node,
            is_vf,
        }))
    }

    /// Check if this device is a GPU (VGA, 3D controller, or display controller).
    pub fn is_gpu(&self) -> bool {
        class::base(self.class) == class::DISPLAY_BASE
    }

    /// Subclass-level name, e.g. "VGA compatible controller".
    pub fn subclass_name(&self) -> &'static str {
        names::subclass_name(self.class)
    }
}

/// Validate PCI address format.
pub fn is_valid_pci_address(address: &str) -> bool {
    PCI_ADDRESS_REGEX.is_match(address)
}

/// Read the current driver binding for a device.
fn read_driver(device_path: &Path) -> Result<Option<String>> {
    sysfs::resolve_optional(&device_path.join("driver"))?
        .map(|target| sysfs::base_name(&target))
        .transpose()
}

/// Read the IOMMU group for a device.
fn read_iommu_group(device_path: &Path) -> Result<Option<u32>> {
    let link = device_path.join("iommu_group");
    match sysfs::resolve_optional(&link)? {
        Some(target) => {
            let group = sysfs::base_name(&target)?;
            sysfs::parse_number(&group, &link).map(Some)
        }
        None => Ok(None),
    }
}

/// Read the NUMA node for a device.
fn read_numa_node(device_path: &Path) -> Result<i32> {
    let numa_path = device_path.join("numa_node");
    match sysfs::read_optional_value(&numa_path)? {
        Some(value) => sysfs::parse_number(&value, &numa_path),
        None => Ok(-1),
    }
}

impl std::fmt::Display for PciDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{:04x}:{:04x}] {} ({})",
            self.address, self.vendor, self.device, self.device_name, self.class_name
        )
    }
}

/// Shorthand used by lookups that must report a missing device.
pub(crate) fn not_found(address: &str) -> XdxError {
    XdxError::DeviceNotFound { address: address.to_string() }
}
