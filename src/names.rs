// 🪪 Name Normalizer - Equivalent renderings of a client name
// Payers write their names as "Tamm Mart", "TAMM, MART" or "Mart Tamm";
// invoices use one fixed form. Every form maps to a small set of variants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// NAME VARIANTS
// ============================================================================

/// Set of name strings that refer to the same person or organization.
///
/// Never empty. Ordered so that iteration (and therefore aggregation) is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameVariants(BTreeSet<String>);

impl NameVariants {
    fn single(name: String) -> Self {
        NameVariants(BTreeSet::from([name]))
    }

    /// True if at least one variant appears in both sets
    pub fn intersects(&self, other: &NameVariants) -> bool {
        // Sets hold one or two entries, a linear scan is enough
        self.0.iter().any(|name| other.0.contains(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Turn a raw name into its set of equivalent variants
///
/// Rules:
/// - "Lastname, Firstname" (any case) → {"Firstname Lastname"}, title-cased
/// - "Word1 Word2" → {"Word1 Word2", "Word2 Word1"}
/// - anything else → the input unchanged
///
/// Example:
/// ```
/// use debt_reconciliation::normalize_name;
///
/// let variants = normalize_name("TAMM, mart");
/// assert!(variants.contains("Mart Tamm"));
/// assert_eq!(variants.iter().count(), 1);
/// ```
pub fn normalize_name(name: &str) -> NameVariants {
    if let Some((lastname, firstname)) = name.split_once(',') {
        return NameVariants::single(format!(
            "{} {}",
            title_case(firstname.trim()),
            title_case(lastname.trim())
        ));
    }

    let parts: Vec<&str> = name.split_whitespace().collect();
    if let [first, second] = parts.as_slice() {
        return NameVariants(BTreeSet::from([
            format!("{} {}", first, second),
            format!("{} {}", second, first),
        ]));
    }

    NameVariants::single(name.to_string())
}

/// Uppercase the first letter of every word, lowercase the rest.
/// A "word" starts after any non-alphabetic character, so "o'neil-smith"
/// becomes "O'Neil-Smith".
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                result.extend(ch.to_uppercase());
            } else {
                result.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(ch);
            at_word_start = true;
        }
    }

    result
}

// ============================================================================
// TESTS
// ============================================================================
