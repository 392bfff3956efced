// 📋 Debtor Report - Plain-text table and JSON output

use crate::invoice_extractor::INVOICE_DATE_FORMAT;
use crate::reconciliation::Debtor;
use anyhow::Result;

const RULE_WIDTH: usize = 80;

/// Largest debt first; equal debts keep invoice order
pub fn sort_by_debt(debtors: &[Debtor]) -> Vec<Debtor> {
    let mut sorted = debtors.to_vec();
    sorted.sort_by(|a, b| b.debt.total_cmp(&a.debt));
    sorted
}

/// Render the debtor table with totals
pub fn render_table(debtors: &[Debtor], currency: &str) -> String {
    let sorted = sort_by_debt(debtors);

    let mut lines = vec![
        String::new(),
        "DEBTORS REPORT".to_string(),
        "=".repeat(RULE_WIDTH),
        format!(
            "{:<30} {:<8} {:<12} {:>8} {:>8} {:>8}",
            "Client", "Invoice", "Date", "Amount", "Paid", "Debt"
        ),
        "-".repeat(RULE_WIDTH),
    ];

    for debtor in &sorted {
        lines.push(format!(
            "{:<30} {:<8} {:<12} {:>8.2} {:>8.2} {:>8.2}",
            debtor.client,
            debtor.invoice_number,
            debtor.invoice_date.format(INVOICE_DATE_FORMAT).to_string(),
            debtor.invoice_amount,
            debtor.paid_amount,
            debtor.debt
        ));
    }

    // Summing an empty f64 iterator gives -0.0
    let total_debt = sorted.iter().fold(0.0, |acc, d| acc + d.debt);

    lines.push("-".repeat(RULE_WIDTH));
    lines.push(format!("Total outstanding: {:.2} {}", total_debt, currency));
    lines.push(format!("Debtors: {}", sorted.len()));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Same ordering as the table, as pretty JSON
pub fn render_json(debtors: &[Debtor]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&sort_by_debt(debtors))?)
}
