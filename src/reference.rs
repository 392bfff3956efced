// 🔎 Reference Extractor - Find the invoice number in a payment description
// Bank descriptions cite invoices in many ways ("Arve nr 12", "ARVE:12",
// "Tasumine arve 12", or just "12"). Patterns go from specific to catch-all.

use lazy_static::lazy_static;
use regex::Regex;

/// Ordered from labeled forms to the last-resort "any digit run".
const INVOICE_REFERENCE_PATTERNS: &[&str] = &[
    r"(?i)Arve nr[.: ]*(\d+)",
    r"(?i)ARVE NR[.: ]*(\d+)",
    r"(?i)Arve number[.: ]*(\d+)",
    r"(?i)ARVE[.: ]*(\d+)",
    r"(?i)Arve[.: ]*(\d+)",
    r"(?i)Tasumine arve[.: ]*(\d+)",
    // Catch-all: first digit run anywhere. Can pick up amounts or dates.
    r"(\d+)",
];

lazy_static! {
    static ref REFERENCE_PATTERNS: Vec<Regex> = INVOICE_REFERENCE_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("invoice reference pattern must compile"))
        .collect();
}

/// Extract the invoice number cited in a free-text payment description
///
/// Returns `None` only when the text holds no usable digit run. A capture
/// too large for `i64` is skipped and the next pattern is tried.
///
/// Example:
/// ```
/// use debt_reconciliation::extract_invoice_number;
///
/// assert_eq!(extract_invoice_number("Arve nr: 1023"), Some(1023));
/// assert_eq!(extract_invoice_number("aitäh!"), None);
/// ```
pub fn extract_invoice_number(description: &str) -> Option<i64> {
    REFERENCE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(description)
            .and_then(|caps| caps.get(1))
            .and_then(|digits| digits.as_str().parse::<i64>().ok())
    })
}
