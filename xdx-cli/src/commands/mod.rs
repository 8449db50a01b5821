//! CLI command implementations

pub mod gpu;
pub mod mdev;

/// Truncate string to max length with ellipsis.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
