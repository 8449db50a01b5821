//! Error types for xdx-core.
//!
//! All errors use `thiserror` and carry the sysfs path involved so callers
//! can log them meaningfully. A device that simply is not an XDXCT GPU is
//! never an error: lookups report it as `Ok(None)`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for xdx-core operations.
pub type Result<T> = std::result::Result<T, XdxError>;

/// Main error type for xdx-core.
#[derive(Error, Debug)]
pub enum XdxError {
    // Lookup errors
    #[error("PCI device not found: {address}")]
    DeviceNotFound { address: String },

    #[error("GPU index {index} out of range (found {len} GPU(s))")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid PCI address format: {address} (expected: 0000:01:00.0)")]
    InvalidPciAddress { address: String },

    // Sysfs errors
    #[error("Failed to resolve {path:?}: {source}")]
    Resolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("mdev type {mdev_type} is not supported by parent device {parent}")]
    UnsupportedMdevType { mdev_type: String, parent: String },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl XdxError {
    /// Create a parse error for the attribute at `path`.
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse { path: path.into(), reason: reason.into() }
    }
}
