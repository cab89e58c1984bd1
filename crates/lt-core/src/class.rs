//! Class label helpers.
//!
//! Class labels are free text, not foreign keys. Every component that
//! filters or groups by class must go through these helpers so the trim
//! and case policy cannot drift between call sites.

/// Normalizes a class label for storage and comparison.
#[must_use]
pub fn normalize(label: &str) -> &str {
    label.trim()
}

/// Exact-match comparison after normalization.
#[must_use]
pub fn matches(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Case-insensitive prefix test, used to select senior classes
/// (e.g. prefix "XII" matches "XII-TP-1" and "xii IPA 2").
#[must_use]
pub fn has_prefix(label: &str, prefix: &str) -> bool {
    normalize(label)
        .to_uppercase()
        .starts_with(&normalize(prefix).to_uppercase())
}
