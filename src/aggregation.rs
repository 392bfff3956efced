// 🧮 Payment Aggregator - Total payments per (name variant, invoice number)
// Payments that cite no invoice number are kept aside for the fallback match

use crate::names::normalize_name;
use crate::parser::PaymentRecord;
use crate::reference::extract_invoice_number;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

// ============================================================================
// TYPES
// ============================================================================

/// Lookup key: one name variant + one invoice number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregationKey {
    pub name: String,
    pub invoice_number: i64,
}

impl AggregationKey {
    pub fn new(name: &str, invoice_number: i64) -> Self {
        AggregationKey {
            name: name.to_string(),
            invoice_number,
        }
    }
}

/// A payment that could not be tied to an invoice number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedPayment {
    /// Payer name exactly as in the feed (normalized again when matching)
    pub name: String,
    pub amount: f64,
    pub date: String,
}

impl From<&PaymentRecord> for UnmatchedPayment {
    fn from(payment: &PaymentRecord) -> Self {
        UnmatchedPayment {
            name: payment.payer.clone(),
            amount: payment.amount,
            date: payment.date.clone(),
        }
    }
}

/// Result of one aggregation pass
#[derive(Debug, Clone, Default)]
pub struct PaymentAggregation {
    pub paid_by_key: HashMap<AggregationKey, f64>,
    /// In feed order
    pub unmatched: Vec<UnmatchedPayment>,
}

impl PaymentAggregation {
    /// Total credited to a key, 0 if nothing was paid under it
    pub fn paid_for(&self, name: &str, invoice_number: i64) -> f64 {
        self.paid_by_key
            .get(&AggregationKey::new(name, invoice_number))
            .copied()
            .unwrap_or(0.0)
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Group payment amounts by (name variant, invoice number)
///
/// A payment is credited in full to the key of *every* variant of its payer
/// name. "Jane Doe" paying 100 for invoice 5 adds 100 to both
/// ("Jane Doe", 5) and ("Doe Jane", 5); the amount is not divided.
///
/// Payments without an invoice number (including a cited number 0) go to the
/// unmatched list.
pub fn aggregate(payments: &[PaymentRecord]) -> PaymentAggregation {
    let mut aggregation = PaymentAggregation::default();

    for payment in payments {
        let variants = normalize_name(&payment.payer);

        match extract_invoice_number(&payment.description) {
            Some(number) if number != 0 => {
                for name in variants.iter() {
                    *aggregation
                        .paid_by_key
                        .entry(AggregationKey::new(name, number))
                        .or_insert(0.0) += payment.amount;
                }
            }
            _ => {
                debug!(payer = %payment.payer, description = %payment.description, "no invoice reference");
                aggregation.unmatched.push(UnmatchedPayment::from(payment));
            }
        }
    }

    info!(
        payments = payments.len(),
        keys = aggregation.paid_by_key.len(),
        unmatched = aggregation.unmatched.len(),
        "aggregated payments"
    );

    aggregation
}

// ============================================================================
// TESTS
// ============================================================================
