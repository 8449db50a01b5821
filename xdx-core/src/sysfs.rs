//! Helpers for reading kernel-exposed sysfs attributes.
//!
//! Attribute files hold a single trimmed text value; relationships (driver,
//! IOMMU group, mdev type) are symlinks whose resolved target names the
//! related object in its final path segment.

use crate::error::{Result, XdxError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Read a value from a sysfs file.
pub fn read_value(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| XdxError::Io { path: path.to_path_buf(), source: e })
}

/// Read a value from a sysfs file that the kernel may not expose.
pub fn read_optional_value(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s.trim().to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(XdxError::Io { path: path.to_path_buf(), source: e }),
    }
}

/// Names of the entries of a sysfs directory, sorted so repeated listings of
/// an unchanged tree come back in the same order.
pub fn list_dir(path: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(path).map_err(|e| XdxError::Io { path: path.to_path_buf(), source: e })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| XdxError::Io { path: path.to_path_buf(), source: e })?;
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    names.sort();
    Ok(names)
}

/// Resolve every symlink in `path` to its canonical location.
pub fn resolve(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| XdxError::Resolution { path: path.to_path_buf(), source: e })
}

/// Resolve a link that may legitimately be absent (e.g. `driver` on an
/// unbound device). A link that exists but points nowhere is still an error.
pub fn resolve_optional(path: &Path) -> Result<Option<PathBuf>> {
    match fs::symlink_metadata(path) {
        Ok(_) => resolve(path).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(XdxError::Resolution { path: path.to_path_buf(), source: e }),
    }
}

/// Final path segment of `path` as a string.
pub fn base_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| XdxError::parse(path, "path has no final segment"))
}

/// Resolve a link and return the name of the object it points at.
pub fn link_name(path: &Path) -> Result<String> {
    base_name(&resolve(path)?)
}

/// Parse a sysfs number: hexadecimal with a `0x` prefix, decimal otherwise.
///
/// `path` is only used for error context.
pub fn parse_number<T: TryFrom<i64>>(raw: &str, path: &Path) -> Result<T> {
    let s = raw.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(XdxError::parse(path, format!("{:?} is not a number", s)));
    }

    let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    }
    .map_err(|e| XdxError::parse(path, format!("{:?} is not a number: {}", s, e)))?;
    let value = if negative { -value } else { value };

    T::try_from(value).map_err(|_| XdxError::parse(path, format!("{} is out of range", value)))
}

/// Read a sysfs file and parse its content as a number.
pub fn read_number<T: TryFrom<i64>>(path: &Path) -> Result<T> {
    parse_number(&read_value(path)?, path)
}
