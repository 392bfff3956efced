// ⚖️ Debt Reconciler - Which invoices are still not paid in full
//
// For every invoice:
//   paid = payments credited to (client as printed on invoice, invoice number)
//   paid >= total            → settled
//   otherwise try fallback   → one unmatched payment with overlapping name
//                              and exactly the invoice total settles it
//   otherwise                → debtor, debt = total - paid

use crate::aggregation::{AggregationKey, PaymentAggregation, UnmatchedPayment};
use crate::db::InvoiceRecord;
use crate::names::{normalize_name, NameVariants};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

// ============================================================================
// DEBTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debtor {
    pub client: String,
    pub invoice_number: i64,
    pub invoice_date: NaiveDate,
    pub invoice_amount: f64,
    pub paid_amount: f64,
    /// invoice_amount - paid_amount
    pub debt: f64,
}

impl Debtor {
    fn from_invoice(invoice: &InvoiceRecord, paid_amount: f64) -> Self {
        Debtor {
            client: invoice.client.clone(),
            invoice_number: invoice.number,
            invoice_date: invoice.issue_date,
            invoice_amount: invoice.total,
            paid_amount,
            debt: invoice.total - paid_amount,
        }
    }
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

/// An underpaid invoice cleared by an unmatched payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackMatch {
    pub invoice_number: i64,
    /// Index into the unmatched list the reconciler was given
    pub payment_index: usize,
    pub payment: UnmatchedPayment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Underpaid invoices, in invoice order
    pub debtors: Vec<Debtor>,
    /// Invoices settled by the keyed lookup alone
    pub settled_count: usize,
    pub fallback_matches: Vec<FallbackMatch>,
    /// Unmatched payments no invoice claimed, in original order
    pub remaining_unmatched: Vec<UnmatchedPayment>,
    pub invoice_count: usize,
}

impl ReconciliationReport {
    pub fn total_debt(&self) -> f64 {
        // Summing an empty f64 iterator gives -0.0
        self.debtors.iter().fold(0.0, |acc, d| acc + d.debt)
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciled {} invoices: {} paid, {} cleared by unmatched payments, {} debtors owing {:.2}; {} unmatched payments left",
            self.invoice_count,
            self.settled_count,
            self.fallback_matches.len(),
            self.debtors.len(),
            self.total_debt(),
            self.remaining_unmatched.len()
        )
    }
}

// ============================================================================
// DEBT RECONCILER
// ============================================================================

pub struct DebtReconciler;

impl DebtReconciler {
    pub fn new() -> Self {
        DebtReconciler
    }

    /// Reconcile invoices against aggregated payments
    ///
    /// The unmatched list is not mutated. Consumption by the fallback match
    /// is tracked per index, so calling this twice on the same inputs gives
    /// the same report.
    ///
    /// Example:
    /// ```
    /// use chrono::NaiveDate;
    /// use debt_reconciliation::{aggregate, DebtReconciler, InvoiceRecord, PaymentRecord};
    ///
    /// let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
    /// let invoices = vec![InvoiceRecord::new(10, "Mart Tamm", date, date, 100.0)];
    /// let payments = vec![PaymentRecord::new("Tamm Mart", "05.01.2025", "Arve nr 10", 60.0, "EUR")];
    ///
    /// let aggregation = aggregate(&payments);
    /// let report = DebtReconciler::new().reconcile_report(
    ///     &invoices,
    ///     &aggregation.paid_by_key,
    ///     &aggregation.unmatched,
    /// );
    ///
    /// assert_eq!(report.debtors.len(), 1);
    /// assert_eq!(report.debtors[0].debt, 40.0);
    /// ```
    pub fn reconcile_report(
        &self,
        invoices: &[InvoiceRecord],
        paid_by_key: &HashMap<AggregationKey, f64>,
        unmatched: &[UnmatchedPayment],
    ) -> ReconciliationReport {
        // Normalize each unmatched payer once, not once per invoice
        let unmatched_variants: Vec<NameVariants> =
            unmatched.iter().map(|p| normalize_name(&p.name)).collect();
        let mut consumed = vec![false; unmatched.len()];

        let mut debtors = Vec::new();
        let mut fallback_matches = Vec::new();
        let mut settled_count = 0;

        for invoice in invoices {
            // Keyed by the raw client name, not its variants
            let paid = paid_by_key
                .get(&AggregationKey::new(&invoice.client, invoice.number))
                .copied()
                .unwrap_or(0.0);

            if paid >= invoice.total {
                settled_count += 1;
                continue;
            }

            let invoice_variants = normalize_name(&invoice.client);
            let candidate = unmatched.iter().enumerate().find_map(|(index, payment)| {
                let usable = !consumed[index]
                    && unmatched_variants[index].intersects(&invoice_variants)
                    && payment.amount == invoice.total;
                usable.then_some(index)
            });

            match candidate {
                Some(index) => {
                    consumed[index] = true;
                    debug!(
                        invoice = invoice.number,
                        payer = %unmatched[index].name,
                        "underpaid invoice cleared by unmatched payment"
                    );
                    fallback_matches.push(FallbackMatch {
                        invoice_number: invoice.number,
                        payment_index: index,
                        payment: unmatched[index].clone(),
                    });
                }
                None => {
                    debug!(invoice = invoice.number, paid, total = invoice.total, "debtor");
                    debtors.push(Debtor::from_invoice(invoice, paid));
                }
            }
        }

        let remaining_unmatched = unmatched
            .iter()
            .zip(&consumed)
            .filter(|(_, used)| !**used)
            .map(|(payment, _)| payment.clone())
            .collect();

        let report = ReconciliationReport {
            debtors,
            settled_count,
            fallback_matches,
            remaining_unmatched,
            invoice_count: invoices.len(),
        };

        info!("{}", report.summary());
        report
    }

    /// Reconcile against a finished aggregation pass
    pub fn reconcile_aggregation(
        &self,
        invoices: &[InvoiceRecord],
        aggregation: &PaymentAggregation,
    ) -> ReconciliationReport {
        self.reconcile_report(invoices, &aggregation.paid_by_key, &aggregation.unmatched)
    }
}

impl Default for DebtReconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Underpaid invoices that no unmatched payment could clear
pub fn reconcile(
    invoices: &[InvoiceRecord],
    paid_by_key: &HashMap<AggregationKey, f64>,
    unmatched: &[UnmatchedPayment],
) -> Vec<Debtor> {
    DebtReconciler::new()
        .reconcile_report(invoices, paid_by_key, unmatched)
        .debtors
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::aggregate;
    use crate::parser::PaymentRecord;
    use pretty_assertions::assert_eq;

    fn invoice(number: i64, client: &str, total: f64) -> InvoiceRecord {
        let issued = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let due = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        InvoiceRecord::new(number, client, issued, due, total)
    }

    fn payment(payer: &str, description: &str, amount: f64) -> PaymentRecord {
        PaymentRecord::new(payer, "10.01.2025", description, amount, "EUR")
    }

    fn unmatched(name: &str, amount: f64) -> UnmatchedPayment {
        UnmatchedPayment {
            name: name.to_string(),
            amount,
            date: "10.01.2025".to_string(),
        }
    }

    fn run(invoices: &[InvoiceRecord], payments: &[PaymentRecord]) -> ReconciliationReport {
        let aggregation = aggregate(payments);
        DebtReconciler::new().reconcile_aggregation(invoices, &aggregation)
    }

    #[test]
    fn test_partial_payment_leaves_debt() {
        let report = run(
            &[invoice(10, "Mart Tamm", 100.0)],
            &[payment("Tamm Mart", "Arve nr 10", 60.0)],
        );

        assert_eq!(report.debtors.len(), 1);
        let debtor = &report.debtors[0];
        assert_eq!(debtor.client, "Mart Tamm");
        assert_eq!(debtor.invoice_number, 10);
        assert_eq!(debtor.invoice_amount, 100.0);
        assert_eq!(debtor.paid_amount, 60.0);
        assert_eq!(debtor.debt, 40.0);
        assert_eq!(debtor.invoice_date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[test]
    fn test_full_and_over_payment_settle() {
        let report = run(
            &[invoice(1, "Mart Tamm", 100.0), invoice(2, "Mart Tamm", 50.0)],
            &[
                payment("Mart Tamm", "Arve nr 1", 100.0),
                payment("Mart Tamm", "Arve nr 2", 80.0),
            ],
        );

        assert!(report.debtors.is_empty());
        assert_eq!(report.settled_count, 2);
    }

    #[test]
    fn test_unpaid_invoice_is_full_debt() {
        let report = run(&[invoice(4, "Mari Maasikas", 75.0)], &[]);

        assert_eq!(report.debtors.len(), 1);
        assert_eq!(report.debtors[0].paid_amount, 0.0);
        assert_eq!(report.debtors[0].debt, 75.0);
    }

    #[test]
    fn test_fallback_clears_unreferenced_payment() {
        let report = run(
            &[invoice(11, "Mari Maasikas", 50.0)],
            &[payment("Maasikas Mari", "thanks", 50.0)],
        );

        assert!(report.debtors.is_empty());
        assert_eq!(report.fallback_matches.len(), 1);
        assert_eq!(report.fallback_matches[0].invoice_number, 11);
        assert!(report.remaining_unmatched.is_empty());
    }

    #[test]
    fn test_fallback_payment_is_consumed_once() {
        let invoices = [invoice(20, "Mari Maasikas", 50.0), invoice(21, "Mari Maasikas", 50.0)];
        let pool = [unmatched("Maasikas Mari", 50.0)];

        let report = DebtReconciler::new().reconcile_report(&invoices, &HashMap::new(), &pool);

        assert_eq!(report.fallback_matches.len(), 1);
        assert_eq!(report.fallback_matches[0].invoice_number, 20);
        assert_eq!(report.debtors.len(), 1);
        assert_eq!(report.debtors[0].invoice_number, 21);
        assert!(report.remaining_unmatched.is_empty());
    }

    #[test]
    fn test_fallback_first_match_wins() {
        let invoices = [invoice(30, "Mart Tamm", 40.0)];
        let pool = [
            unmatched("Mari Maasikas", 40.0),
            unmatched("TAMM, MART", 40.0),
            unmatched("Tamm Mart", 40.0),
        ];

        let report = DebtReconciler::new().reconcile_report(&invoices, &HashMap::new(), &pool);

        assert_eq!(report.fallback_matches[0].payment_index, 1);
        assert_eq!(
            report.remaining_unmatched,
            vec![unmatched("Mari Maasikas", 40.0), unmatched("Tamm Mart", 40.0)]
        );
    }

    #[test]
    fn test_fallback_needs_exact_amount() {
        let invoices = [invoice(31, "Mart Tamm", 40.0)];
        let pool = [unmatched("Tamm Mart", 39.99), unmatched("Tamm Mart", 40.01)];

        let debtors = reconcile(&invoices, &HashMap::new(), &pool);

        assert_eq!(debtors.len(), 1);
        assert_eq!(debtors[0].debt, 40.0);
    }

    #[test]
    fn test_fallback_needs_name_overlap() {
        let invoices = [invoice(32, "Mart Tamm", 40.0)];
        let pool = [unmatched("Mart Kask", 40.0)];

        assert_eq!(reconcile(&invoices, &HashMap::new(), &pool).len(), 1);
    }

    #[test]
    fn test_fallback_ignores_partial_payments_on_record() {
        // Fallback compares the unmatched amount with the full total, not the rest
        let report = run(
            &[invoice(33, "Mart Tamm", 100.0)],
            &[
                payment("Mart Tamm", "Arve nr 33", 60.0),
                payment("Mart Tamm", "ülejäänud", 40.0),
            ],
        );

        assert_eq!(report.debtors.len(), 1);
        assert_eq!(report.debtors[0].debt, 40.0);
        assert_eq!(report.remaining_unmatched.len(), 1);
    }

    #[test]
    fn test_primary_lookup_uses_raw_invoice_name() {
        // Payment keys are normalized, the invoice lookup is not: the comma
        // form printed on the invoice never finds the referenced payment
        let report = run(
            &[invoice(40, "TAMM, MART", 100.0)],
            &[payment("Mart Tamm", "Arve nr 40", 100.0)],
        );

        assert_eq!(report.debtors.len(), 1);
        assert_eq!(report.debtors[0].paid_amount, 0.0);
    }

    #[test]
    fn test_double_booked_variants_both_count() {
        // Each payment is booked in full under both orderings, so invoices
        // printed in either order see the whole amount
        let invoices = [invoice(50, "Mart Tamm", 100.0), invoice(51, "Tamm Mart", 100.0)];
        let report = run(
            &invoices,
            &[
                payment("Mart Tamm", "Arve nr 50", 60.0),
                payment("Mart Tamm", "Arve nr 51", 60.0),
            ],
        );

        let paid: Vec<f64> = report.debtors.iter().map(|d| d.paid_amount).collect();
        assert_eq!(paid, vec![60.0, 60.0]);
    }

    #[test]
    fn test_debtors_keep_invoice_order() {
        let invoices = [
            invoice(3, "Mart Tamm", 10.0),
            invoice(1, "Mari Maasikas", 30.0),
            invoice(2, "Jaan Kask", 20.0),
        ];

        let numbers: Vec<i64> = reconcile(&invoices, &HashMap::new(), &[])
            .iter()
            .map(|d| d.invoice_number)
            .collect();
        assert_eq!(numbers, vec![3, 1, 2]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let invoices = [
            invoice(10, "Mart Tamm", 100.0),
            invoice(11, "Mari Maasikas", 50.0),
            invoice(12, "Mari Maasikas", 50.0),
        ];
        let aggregation = aggregate(&[
            payment("Tamm Mart", "Arve nr 10", 60.0),
            payment("Maasikas Mari", "thanks", 50.0),
        ]);

        let first = reconcile(&invoices, &aggregation.paid_by_key, &aggregation.unmatched);
        let second = reconcile(&invoices, &aggregation.paid_by_key, &aggregation.unmatched);

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(aggregation.unmatched.len(), 1, "input list is left untouched");
    }

    #[test]
    fn test_report_summary() {
        let report = run(
            &[invoice(10, "Mart Tamm", 100.0), invoice(11, "Mari Maasikas", 50.0)],
            &[
                payment("Tamm Mart", "Arve nr 10", 60.0),
                payment("Maasikas Mari", "thanks", 50.0),
            ],
        );

        assert_eq!(report.total_debt(), 40.0);
        assert_eq!(
            report.summary(),
            "Reconciled 2 invoices: 0 paid, 1 cleared by unmatched payments, 1 debtors owing 40.00; 0 unmatched payments left"
        );
    }

    #[test]
    fn test_empty_report_owes_positive_zero() {
        let report = run(&[], &[]);

        assert!(report.total_debt().is_sign_positive());
        assert_eq!(
            report.summary(),
            "Reconciled 0 invoices: 0 paid, 0 cleared by unmatched payments, 0 debtors owing 0.00; 0 unmatched payments left"
        );
    }
}
