//! `xdx mdevs` and `xdx parents` commands

use super::truncate;
use anyhow::{Context, Result};
use xdx_core::{Config, MdevLib, ParentDevice};

/// List all XDXCT vGPU instances.
pub fn list(config: &Config, json: bool) -> Result<()> {
    let lib = MdevLib::new(config.clone());
    let devices = lib
        .get_all_mediated_devices()
        .with_context(|| format!("Failed to scan {}", lib.config().mdev_device_root.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No vGPU devices found");
        return Ok(());
    }

    println!(
        "{:<38} {:<12} {:<15} {:<12} {:<6}",
        "UUID", "TYPE", "PARENT", "DRIVER", "IOMMU"
    );
    println!("{}", "-".repeat(87));

    for mdev in &devices {
        println!(
            "{:<38} {:<12} {:<15} {:<12} {:<6}",
            mdev.uuid,
            truncate(&mdev.mdev_type, 12),
            mdev.parent.address(),
            truncate(&mdev.driver, 12),
            mdev.iommu_group
        );
    }

    println!();
    println!("Total: {} vGPU(s)", devices.len());
    Ok(())
}

/// List GPUs that can host vGPUs.
pub fn parents(config: &Config, mdev_bus: bool, json: bool) -> Result<()> {
    let lib = MdevLib::new(config.clone());
    let parents = if mdev_bus {
        lib.get_mdev_bus_parents()
            .with_context(|| format!("Failed to scan {}", lib.config().mdev_bus_root.display()))?
    } else {
        lib.get_all_parent_devices().with_context(|| {
            format!("Failed to scan {}", lib.config().pci_devices_root.display())
        })?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&parents)?);
        return Ok(());
    }

    if parents.is_empty() {
        println!("No vGPU-capable GPUs found");
        return Ok(());
    }

    println!("{:<15} {:<10} {:<8} {}", "PCI ADDRESS", "DRIVER", "IOMMU", "MDEV TYPES (AVAILABLE)");
    println!("{}", "-".repeat(80));

    for parent in &parents {
        let gpu = &parent.device;
        let iommu = gpu.iommu_group.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<15} {:<10} {:<8} {}",
            gpu.address,
            gpu.driver.as_deref().unwrap_or("-"),
            iommu,
            describe_types(parent)
        );
    }

    println!();
    println!("Total: {} parent GPU(s)", parents.len());
    Ok(())
}

/// "xgv-1(4), xgv-2(2)"; availability is shown as "?" when unreadable.
fn describe_types(parent: &ParentDevice) -> String {
    parent
        .mdev_types
        .keys()
        .map(|name| {
            let available = parent
                .available_instances(name)
                .map(|n| n.to_string())
                .unwrap_or_else(|_| "?".to_string());
            format!("{}({})", name, available)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
