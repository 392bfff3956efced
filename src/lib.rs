// Debt Reconciliation - Core Library
// Invoice import, payment matching and the debtor report, shared by the CLI and tests

pub mod db;
pub mod parser;
pub mod names;              // Name variants for client matching
pub mod reference;          // Invoice number in payment descriptions
pub mod aggregation;        // Payments totalled per (name, invoice)
pub mod reconciliation;     // Underpaid invoices + fallback matching
pub mod invoice_extractor;  // Invoice documents → store
pub mod report;
pub mod config;
pub mod pipeline;

// Re-export commonly used types
pub use db::{
    InvoiceRecord,
    setup_database, insert_invoice, get_all_invoices, verify_count,
};
pub use parser::{
    PaymentRecord, PaymentParser, BankCsvParser, parse_amount,
};
pub use names::{NameVariants, normalize_name, title_case};
pub use reference::extract_invoice_number;
pub use aggregation::{
    AggregationKey, UnmatchedPayment, PaymentAggregation, aggregate,
};
pub use reconciliation::{
    DebtReconciler, ReconciliationReport, Debtor, FallbackMatch, reconcile,
};
pub use invoice_extractor::{
    ExtractionError, DocumentReader, PlainTextReader, ImportSummary, ImportFailure,
    extract_invoice_fields, import_invoice_folder, default_readers,
};
#[cfg(feature = "pdf")]
pub use invoice_extractor::PdfReader;
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
