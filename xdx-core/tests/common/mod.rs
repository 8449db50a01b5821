//! Sysfs fixture trees for integration tests.
//!
//! Lays out a miniature sysfs under a temp directory, with the same
//! directory-plus-symlink shape the kernel exposes:
//!
//! ```text
//! <tmp>/devices/pci0000:00/<address>/       real device directories
//! <tmp>/bus/pci/devices/<address>           -> ../../../devices/pci0000:00/<address>
//! <tmp>/bus/mdev/devices/<uuid>             -> <device dir>/<uuid>
//! <tmp>/class/mdev_bus/<address>            -> <device dir>
//! <tmp>/kernel/iommu_groups/<n>/
//! <tmp>/bus/{pci,mdev}/drivers/<name>/
//! ```

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use xdx_core::Config;

pub const XDX_VENDOR: &str = "0x1eed";
pub const VGA_CLASS: &str = "0x030000";

/// Attributes of a fixture PCI device. `None` leaves the file or link out.
pub struct PciSpec<'a> {
    pub address: &'a str,
    pub vendor: &'a str,
    pub class: &'a str,
    pub device: &'a str,
    pub driver: Option<&'a str>,
    pub iommu_group: Option<&'a str>,
    pub numa_node: Option<&'a str>,
}

impl<'a> PciSpec<'a> {
    /// A bound XDXCT VGA controller.
    pub fn xdx_gpu(address: &'a str) -> Self {
        Self {
            address,
            vendor: XDX_VENDOR,
            class: VGA_CLASS,
            device: "0x1330",
            driver: Some("xgv"),
            iommu_group: Some("12"),
            numa_node: Some("-1"),
        }
    }
}

pub struct SysfsFixture {
    dir: TempDir,
}

impl SysfsFixture {
    pub fn new() -> Self {
        let fixture = Self { dir: TempDir::new().expect("Failed to create temp directory") };
        fs::create_dir_all(fixture.pci_root()).unwrap();
        fs::create_dir_all(fixture.mdev_device_root()).unwrap();
        fs::create_dir_all(fixture.devices_root()).unwrap();
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn pci_root(&self) -> PathBuf {
        self.root().join("bus/pci/devices")
    }

    pub fn mdev_device_root(&self) -> PathBuf {
        self.root().join("bus/mdev/devices")
    }

    pub fn mdev_bus_root(&self) -> PathBuf {
        self.root().join("class/mdev_bus")
    }

    pub fn devices_root(&self) -> PathBuf {
        self.root().join("devices/pci0000:00")
    }

    pub fn config(&self) -> Config {
        Config::default()
            .with_pci_devices_root(self.pci_root())
            .with_mdev_bus_root(self.mdev_bus_root())
            .with_mdev_device_root(self.mdev_device_root())
    }

    /// Create a PCI device and its bus link; returns the real device directory.
    pub fn add_pci_device(&self, spec: &PciSpec) -> PathBuf {
        let dir = self.devices_root().join(spec.address);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("vendor"), format!("{}\n", spec.vendor)).unwrap();
        fs::write(dir.join("class"), format!("{}\n", spec.class)).unwrap();
        fs::write(dir.join("device"), format!("{}\n", spec.device)).unwrap();
        if let Some(numa) = spec.numa_node {
            fs::write(dir.join("numa_node"), format!("{}\n", numa)).unwrap();
        }
        if let Some(driver) = spec.driver {
            symlink(self.driver_dir("pci", driver), dir.join("driver")).unwrap();
        }
        if let Some(group) = spec.iommu_group {
            symlink(self.iommu_group_dir(group), dir.join("iommu_group")).unwrap();
        }
        symlink(&dir, self.pci_root().join(spec.address)).unwrap();
        dir
    }

    /// Mark `device_dir` as an SR-IOV virtual function of `pf_dir`.
    pub fn add_physfn(&self, device_dir: &Path, pf_dir: &Path) {
        symlink(pf_dir, device_dir.join("physfn")).unwrap();
    }

    /// Add a supported-type descriptor; returns its directory.
    pub fn add_mdev_type(&self, device_dir: &Path, dir_name: &str, name: &str) -> PathBuf {
        let dir = device_dir.join("mdev_supported_types").join(dir_name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("name"), format!("{}\n", name)).unwrap();
        fs::write(dir.join("available_instances"), "4\n").unwrap();
        dir
    }

    /// Add a vGPU instance below `device_dir` and list it on the mdev bus;
    /// returns the backing directory.
    pub fn add_mdev(
        &self,
        device_dir: &Path,
        uuid: &str,
        type_dir: &Path,
        iommu_group: &str,
    ) -> PathBuf {
        let dir = device_dir.join(uuid);
        fs::create_dir_all(&dir).unwrap();
        symlink(type_dir, dir.join("mdev_type")).unwrap();
        symlink(self.driver_dir("mdev", "vfio_mdev"), dir.join("driver")).unwrap();
        symlink(self.iommu_group_dir(iommu_group), dir.join("iommu_group")).unwrap();
        symlink(&dir, self.mdev_device_root().join(uuid)).unwrap();
        dir
    }

    /// List `device_dir` as an mdev-capable parent on the mdev bus.
    pub fn register_mdev_bus_parent(&self, device_dir: &Path) {
        fs::create_dir_all(self.mdev_bus_root()).unwrap();
        let name = device_dir.file_name().unwrap();
        symlink(device_dir, self.mdev_bus_root().join(name)).unwrap();
    }

    fn driver_dir(&self, bus: &str, name: &str) -> PathBuf {
        let dir = self.root().join("bus").join(bus).join("drivers").join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn iommu_group_dir(&self, group: &str) -> PathBuf {
        let dir = self.root().join("kernel/iommu_groups").join(group);
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}
