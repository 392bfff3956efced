// 🔁 Pipeline - The two stages, wired to files on disk
//   import:       invoice documents → SQLite
//   find_debtors: SQLite + payment CSV → reconciliation report

use crate::aggregation::aggregate;
use crate::config::Config;
use crate::db::{get_all_invoices, setup_database, verify_count};
use crate::invoice_extractor::{default_readers, import_invoice_folder, ImportSummary};
use crate::parser::{BankCsvParser, PaymentParser};
use crate::reconciliation::{DebtReconciler, ReconciliationReport};
use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

/// Rebuild the invoice store from the invoice folder
pub fn import_invoices(config: &Config) -> Result<ImportSummary> {
    let conn = Connection::open(&config.database_path).with_context(|| {
        format!("Failed to open database: {}", config.database_path.display())
    })?;
    setup_database(&conn)?;

    info!(folder = %config.invoices_dir.display(), "importing invoices");
    let summary = import_invoice_folder(&conn, &config.invoices_dir, &default_readers())?;

    let stored = verify_count(&conn)?;
    if stored != summary.processed as i64 {
        warn!(stored, processed = summary.processed, "stored invoice count differs from processed");
    } else {
        info!(stored, "verified invoice count");
    }

    Ok(summary)
}

/// Reconcile stored invoices against the payment feed
pub fn find_debtors(config: &Config) -> Result<ReconciliationReport> {
    if !config.database_path.exists() {
        bail!(
            "Invoice database not found: {} (run the import first)",
            config.database_path.display()
        );
    }

    let conn = Connection::open(&config.database_path).with_context(|| {
        format!("Failed to open database: {}", config.database_path.display())
    })?;
    let invoices = get_all_invoices(&conn)
        .with_context(|| format!("Failed to load invoices from {}", config.database_path.display()))?;
    info!(count = invoices.len(), "loaded invoices");

    let payments = BankCsvParser::new().parse(&config.payments_path)?;
    info!(count = payments.len(), "loaded payments");

    let aggregation = aggregate(&payments);
    Ok(DebtReconciler::new().reconcile_aggregation(&invoices, &aggregation))
}
