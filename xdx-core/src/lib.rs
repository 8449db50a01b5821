//! XDXCT GPU and vGPU discovery for Linux.
//!
//! Reads kernel-exposed sysfs metadata to enumerate XDXCT GPUs on the PCI
//! bus and the mediated (vGPU) devices carved out of them. Every call
//! re-reads sysfs and returns plain value snapshots.
//!
//! ```rust,ignore
//! use xdx_core::{Config, GpuEnumerator, MdevLib, PciLib};
//!
//! let config = Config::default().with_env_overrides();
//! let gpus = PciLib::from_config(&config).get_gpus()?;
//! let vgpus = MdevLib::new(config).get_all_mediated_devices()?;
//! ```

pub mod config;
pub mod error;
pub mod mdev;
pub mod observability;
pub mod pci;
pub mod sysfs;

// Re-export commonly used items
pub use config::Config;
pub use error::{Result, XdxError};
pub use mdev::{MdevLib, MediatedDevice, ParentDevice};
pub use pci::{GpuEnumerator, PciDevice, PciLib};
