//! Comparison keys for case/whitespace-insensitive lookup.

/// Lowercase, collapse whitespace runs to a single space, trim.
///
/// Used identically for map-key construction and lookup.
pub fn normalize(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}
