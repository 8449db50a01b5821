//! Mediated device (vGPU) instances.
//!
//! An instance is listed by UUID under the mdev device root, as a symlink
//! into the PCI tree below its parent GPU:
//!
//! ```text
//! /sys/bus/mdev/devices/<uuid> -> /sys/devices/pci0000:00/0000:00:01.0/0000:01:00.0/<uuid>
//! <uuid>/
//! ├── mdev_type     -> ../mdev_supported_types/xgv-XGV_V0_1
//! ├── driver        -> /sys/bus/mdev/drivers/vfio_mdev
//! └── iommu_group   -> /sys/kernel/iommu_groups/25
//! ```

use crate::config::Config;
use crate::error::{Result, XdxError};
use crate::mdev::parent::ParentDevice;
use crate::mdev::parse_type_name;
use crate::sysfs;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A vGPU instance and the GPU it was carved out of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediatedDevice {
    /// Canonical (symlink-resolved) sysfs path
    pub path: PathBuf,
    pub uuid: String,
    /// Type name parsed from `mdev_type/name` (e.g. "xgv-1")
    pub mdev_type: String,
    pub driver: String,
    pub iommu_group: u32,
    pub parent: ParentDevice,
}

impl MediatedDevice {
    /// Resolve the instance listed at `instance_path`.
    ///
    /// Returns `Ok(None)` when the owning device is not an XDXCT GPU. An
    /// instance whose type its GPU does not offer, including a GPU that
    /// offers no types at all, fails with `UnsupportedMdevType`. Any
    /// unresolvable link or unparseable attribute fails the instance.
    pub fn resolve(instance_path: &Path, config: &Config) -> Result<Option<Self>> {
        let uuid = sysfs::base_name(instance_path)?;
        let path = sysfs::resolve(instance_path)?;

        let parent_path = path
            .parent()
            .ok_or_else(|| XdxError::parse(&path, "mdev path has no parent device"))?;
        let Some(parent) = ParentDevice::resolve_owner(parent_path, config)? else {
            debug!(uuid = %uuid, parent = %parent_path.display(), "mdev parent is not ours");
            return Ok(None);
        };

        let mdev_type = read_mdev_type(&path)?;
        let driver = sysfs::link_name(&path.join("driver"))?;
        let iommu_group = read_iommu_group(&path)?;

        if !parent.supports_mdev_type(&mdev_type) {
            return Err(XdxError::UnsupportedMdevType {
                mdev_type,
                parent: parent.device.address.clone(),
            });
        }

        debug!(
            uuid = %uuid,
            mdev_type = %mdev_type,
            driver = %driver,
            iommu_group = %iommu_group,
            parent = %parent.device.address,
            "Resolved mdev device"
        );

        Ok(Some(Self { path, uuid, mdev_type, driver, iommu_group, parent }))
    }

    /// Descriptor directory of this instance's type on its parent.
    pub fn mdev_type_path(&self) -> Option<&Path> {
        self.parent.mdev_type_path(&self.mdev_type)
    }
}

fn read_mdev_type(mdev_path: &Path) -> Result<String> {
    let type_dir = sysfs::resolve(&mdev_path.join("mdev_type"))?;
    let name_path = type_dir.join("name");
    let content = sysfs::read_value(&name_path)?;
    parse_type_name(&content, &name_path)
}

fn read_iommu_group(mdev_path: &Path) -> Result<u32> {
    let link = mdev_path.join("iommu_group");
    let group = sysfs::link_name(&link)?;
    sysfs::parse_number(&group, &link)
}
