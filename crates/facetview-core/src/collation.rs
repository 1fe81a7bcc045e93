//! # Label Collation
//!
//! Locale-aware ordering for property labels, used to fix the canonical
//! column order of normalized entities.
//!
//! Comparison runs in three levels, like a root-locale collator:
//! 1. base letters (accents stripped, case folded)
//! 2. accents
//! 3. case, lowercase first
//!
//! A final byte comparison makes the order total, so distinct labels never
//! compare equal.

use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

fn base_key(label: &str) -> String {
    label
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn accent_key(label: &str) -> String {
    label.nfd().flat_map(char::to_lowercase).collect()
}

fn case_key(label: &str) -> impl Iterator<Item = bool> + '_ {
    label
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(char::is_uppercase)
}

/// Compare two labels in locale-aware order.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    base_key(a)
        .cmp(&base_key(b))
        .then_with(|| accent_key(a).cmp(&accent_key(b)))
        .then_with(|| case_key(a).cmp(case_key(b)))
        .then_with(|| a.cmp(b))
}
