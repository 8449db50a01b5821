//! Human-readable names for PCI classes and devices.
//!
//! Class names are fixed by the PCI specification. Device names come from a
//! `pci.ids` database when one is configured; otherwise devices are reported
//! as [`UNKNOWN_DEVICE`].

use crate::error::{Result, XdxError};
use crate::pci::class;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Device name used when no database entry exists.
pub const UNKNOWN_DEVICE: &str = "UNKNOWN_DEVICE";

/// Name of the base class of `class` (bits 23..16).
pub fn class_name(class: u32) -> &'static str {
    match class::base(class) {
        0x00 => "Unclassified device",
        0x01 => "Mass storage controller",
        0x02 => "Network controller",
        0x03 => "Display controller",
        0x04 => "Multimedia controller",
        0x05 => "Memory controller",
        0x06 => "Bridge",
        0x07 => "Communication controller",
        0x08 => "Generic system peripheral",
        0x09 => "Input device controller",
        0x0a => "Docking station",
        0x0b => "Processor",
        0x0c => "Serial bus controller",
        0x0d => "Wireless controller",
        0x0e => "Intelligent controller",
        0x0f => "Satellite communications controller",
        0x10 => "Encryption controller",
        0x11 => "Signal processing controller",
        0x12 => "Processing accelerators",
        0x13 => "Non-Essential Instrumentation",
        0x40 => "Coprocessor",
        _ => "Unassigned class",
    }
}

/// Name of the subclass of a display-class code.
pub fn subclass_name(class: u32) -> &'static str {
    match class::subclass(class) {
        0x0300 => "VGA compatible controller",
        0x0301 => "XGA compatible controller",
        0x0302 => "3D controller",
        0x0380 => "Display controller",
        _ => class_name(class),
    }
}

/// Device names of one vendor, loaded from a `pci.ids` database.
#[derive(Debug, Clone, Default)]
pub struct PciIds {
    vendor_name: Option<String>,
    devices: HashMap<u16, String>,
}

impl PciIds {
    /// Load the entries of `vendor_id` from the database at `path`.
    pub fn load(path: &Path, vendor_id: u16) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| XdxError::Io { path: path.to_path_buf(), source: e })?;
        let ids = Self::parse(&content, vendor_id);
        debug!(
            path = %path.display(),
            vendor = ?ids.vendor_name,
            devices = ids.devices.len(),
            "Loaded PCI ID database"
        );
        Ok(ids)
    }

    /// Parse the vendor section of a `pci.ids` file.
    ///
    /// Vendor lines are `vvvv  Name`, device lines are `\tdddd  Name`,
    /// subsystem lines are indented twice and ignored.
    pub fn parse(content: &str, vendor_id: u16) -> Self {
        let wanted = format!("{:04x}", vendor_id);
        let mut ids = Self::default();
        let mut in_vendor = false;

        for line in content.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if !line.starts_with('\t') {
                if in_vendor {
                    break;
                }
                if let Some((id, name)) = split_entry(line) {
                    if id.eq_ignore_ascii_case(&wanted) {
                        in_vendor = true;
                        ids.vendor_name = Some(name.to_string());
                    }
                }
                continue;
            }
            if !in_vendor || line.starts_with("\t\t") {
                continue;
            }
            if let Some((id, name)) = split_entry(&line[1..]) {
                if let Ok(device) = u16::from_str_radix(id, 16) {
                    ids.devices.insert(device, name.to_string());
                }
            }
        }

        ids
    }

    pub fn vendor_name(&self) -> Option<&str> {
        self.vendor_name.as_deref()
    }

    pub fn device_name(&self, device: u16) -> Option<&str> {
        self.devices.get(&device).map(String::as_str)
    }
}

fn split_entry(line: &str) -> Option<(&str, &str)> {
    let (id, name) = line.split_once(char::is_whitespace)?;
    Some((id, name.trim()))
}
