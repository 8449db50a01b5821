//! `xdx gpus` and `xdx gpu` commands

use super::truncate;
use anyhow::{bail, Context, Result};
use xdx_core::{Config, GpuEnumerator, PciDevice, PciLib};

/// List all XDXCT GPUs on the system.
pub fn list(config: &Config, json: bool) -> Result<()> {
    let pci = PciLib::from_config(config);
    let gpus =
        pci.get_gpus().with_context(|| format!("Failed to scan {}", pci.root().display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&gpus)?);
        return Ok(());
    }

    if gpus.is_empty() {
        println!("No GPUs with vendor ID {:04x} detected", pci.vendor_id());
        return Ok(());
    }

    println!(
        "{:<4} {:<15} {:<8} {:<24} {:<10} {:<8} {:<6} {:<4}",
        "IDX", "PCI ADDRESS", "DEVICE", "NAME", "DRIVER", "IOMMU", "NUMA", "VF"
    );
    println!("{}", "-".repeat(86));

    for (index, gpu) in gpus.iter().enumerate() {
        let driver = gpu.driver.as_deref().unwrap_or("-");
        let iommu = gpu.iommu_group.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4} {:<15} {:<8} {:<24} {:<10} {:<8} {:<6} {:<4}",
            index,
            gpu.address,
            format!("{:04x}", gpu.device),
            truncate(&gpu.device_name, 24),
            driver,
            iommu,
            gpu.numa_node,
            if gpu.is_vf { "yes" } else { "no" }
        );
    }

    println!();
    println!("Total: {} GPU(s)", gpus.len());

    let unbound = gpus.iter().filter(|g| g.driver.is_none()).count();
    if unbound > 0 {
        println!("Note: {} GPU(s) not bound to any driver", unbound);
    }

    Ok(())
}

/// Show one GPU, selected by index or PCI address.
pub fn show(
    config: &Config,
    index: Option<usize>,
    address: Option<&str>,
    json: bool,
) -> Result<()> {
    let pci = PciLib::from_config(config);
    let gpu = match (index, address) {
        (_, Some(address)) => pci.get_gpu_by_address(address)?,
        (Some(index), None) => pci.get_gpu_by_index(index)?,
        (None, None) => bail!("Either --index or --address is required"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&gpu)?);
    } else {
        print_details(&gpu);
    }
    Ok(())
}

fn print_details(gpu: &PciDevice) {
    println!("{}", gpu);
    println!();
    println!("Path:         {}", gpu.path.display());
    println!("Address:      {}", gpu.address);
    println!("Vendor:       {:04x}", gpu.vendor);
    println!("Class:        {:06x} ({}, {})", gpu.class, gpu.class_name, gpu.subclass_name());
    println!("Device:       {:04x} ({})", gpu.device, gpu.device_name);
    println!("Driver:       {}", gpu.driver.as_deref().unwrap_or("-"));
    println!(
        "IOMMU group:  {}",
        gpu.iommu_group.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!("NUMA node:    {}", gpu.numa_node);
    println!("Virtual fn:   {}", if gpu.is_vf { "yes" } else { "no" });
}
