// 🧾 Invoice Extractor - Invoice documents → InvoiceRecord rows
//
// Invoices are generated from one template, so every field sits behind a
// fixed label:
//
//   Arve nr: 1023
//   Arve kuupäev: 02.01.2025
//   Maksetähtaeg: 16.01.2025
//   Klient:
//   Mart Tamm
//   ...
//   SUMMA 100 EUR

use crate::db::{insert_invoice, InvoiceRecord};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Date format printed on invoices
pub const INVOICE_DATE_FORMAT: &str = "%d.%m.%Y";

/// Progress is logged every this many imported invoices
const PROGRESS_INTERVAL: usize = 100;

lazy_static! {
    static ref NUMBER_PATTERN: Regex = Regex::new(r"Arve nr: (\d+)").unwrap();
    static ref ISSUE_DATE_PATTERN: Regex =
        Regex::new(r"Arve kuupäev: (\d{2}\.\d{2}\.\d{4})").unwrap();
    static ref DUE_DATE_PATTERN: Regex =
        Regex::new(r"Maksetähtaeg: (\d{2}\.\d{2}\.\d{4})").unwrap();
    // Client name is the first non-blank line after the label
    static ref CLIENT_PATTERN: Regex = Regex::new(r"Klient:\s*\n\s*(.*?)(?:\n|$)").unwrap();
    static ref TOTAL_PATTERN: Regex =
        Regex::new(r"(?i)SUMMA\s*(\d+(?:[.,]\d+)?)\s*eur").unwrap();
}

// ============================================================================
// ERRORS
// ============================================================================

/// Errors related to invoice field extraction.
#[derive(Error, Debug, PartialEq)]
pub enum ExtractionError {
    /// One or more required fields were not found.
    #[error("missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A field was found but its value is unusable.
    #[error("invalid {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    /// Text could not be pulled out of the document.
    #[error("failed to read document text: {0}")]
    Unreadable(String),
}

// ============================================================================
// FIELD EXTRACTION
// ============================================================================

/// Extract an invoice from the text of its first page
///
/// All five fields are required; every missing one is listed in the error.
pub fn extract_invoice_fields(text: &str) -> Result<InvoiceRecord, ExtractionError> {
    let number = capture(&NUMBER_PATTERN, text);
    let client = capture(&CLIENT_PATTERN, text)
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let issue_date = capture(&ISSUE_DATE_PATTERN, text);
    let due_date = capture(&DUE_DATE_PATTERN, text);
    let total = capture(&TOTAL_PATTERN, text);

    let missing: Vec<&'static str> = [
        ("number", number.is_none()),
        ("client", client.is_none()),
        ("issue_date", issue_date.is_none()),
        ("due_date", due_date.is_none()),
        ("total", total.is_none()),
    ]
    .into_iter()
    .filter_map(|(field, absent)| absent.then_some(field))
    .collect();

    match (number, client, issue_date, due_date, total) {
        (Some(number), Some(client), Some(issue_date), Some(due_date), Some(total)) => {
            Ok(InvoiceRecord {
                number: number.parse().map_err(|_| invalid("number", number))?,
                client: client.to_string(),
                issue_date: parse_invoice_date("issue_date", issue_date)?,
                due_date: parse_invoice_date("due_date", due_date)?,
                total: total
                    .replace(',', ".")
                    .parse()
                    .map_err(|_| invalid("total", total))?,
            })
        }
        _ => Err(ExtractionError::MissingFields(missing)),
    }
}

fn capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn invalid(field: &'static str, value: &str) -> ExtractionError {
    ExtractionError::InvalidValue {
        field,
        value: value.to_string(),
    }
}

fn parse_invoice_date(field: &'static str, value: &str) -> Result<NaiveDate, ExtractionError> {
    NaiveDate::parse_from_str(value, INVOICE_DATE_FORMAT).map_err(|_| invalid(field, value))
}

// ============================================================================
// DOCUMENT READERS
// ============================================================================

/// DocumentReader - Pulls the first page's text out of an invoice document
pub trait DocumentReader {
    /// Check if this reader can handle a given file
    fn handles(&self, path: &Path) -> bool;

    /// Text of the document's first page
    fn read_text(&self, path: &Path) -> Result<String, ExtractionError>;
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Text up to the first page break
fn first_page(text: &str) -> &str {
    text.split('\u{0c}').next().unwrap_or(text)
}

/// PDF invoices, text extracted with pdf-extract
#[cfg(feature = "pdf")]
pub struct PdfReader;

#[cfg(feature = "pdf")]
impl DocumentReader for PdfReader {
    fn handles(&self, path: &Path) -> bool {
        has_extension(path, "pdf")
    }

    fn read_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let bytes = fs::read(path).map_err(|e| ExtractionError::Unreadable(e.to_string()))?;
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;

        Ok(first_page(&text).to_string())
    }
}

/// Already-extracted page text saved as `.txt`
pub struct PlainTextReader;

impl DocumentReader for PlainTextReader {
    fn handles(&self, path: &Path) -> bool {
        has_extension(path, "txt")
    }

    fn read_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let text =
            fs::read_to_string(path).map_err(|e| ExtractionError::Unreadable(e.to_string()))?;

        Ok(first_page(&text).to_string())
    }
}

/// Every reader compiled into this build
pub fn default_readers() -> Vec<Box<dyn DocumentReader>> {
    let mut readers: Vec<Box<dyn DocumentReader>> = Vec::new();

    #[cfg(feature = "pdf")]
    readers.push(Box::new(PdfReader));

    readers.push(Box::new(PlainTextReader));
    readers
}

// ============================================================================
// FOLDER IMPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportFailure {
    pub file: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Invoices stored
    pub processed: usize,
    /// Documents that were read but could not be stored
    pub failures: Vec<ImportFailure>,
    /// Files no reader handles
    pub skipped: usize,
}

/// Extract one document and store it
fn import_document(conn: &Connection, path: &Path, reader: &dyn DocumentReader) -> Result<InvoiceRecord> {
    let text = reader.read_text(path)?;
    let invoice = extract_invoice_fields(&text)?;
    insert_invoice(conn, &invoice)?;
    Ok(invoice)
}

/// Import every invoice document in a folder
///
/// Files are visited in name order. A document that fails is logged and
/// recorded in the summary; the rest of the folder is still imported.
pub fn import_invoice_folder(
    conn: &Connection,
    dir: &Path,
    readers: &[Box<dyn DocumentReader>],
) -> Result<ImportSummary> {
    let mut paths = fs::read_dir(dir)
        .with_context(|| format!("Failed to read invoice folder: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to list invoice folder: {}", dir.display()))?;
    paths.sort();

    let mut summary = ImportSummary::default();

    for path in paths.iter().filter(|p| p.is_file()) {
        let Some(reader) = readers.iter().find(|r| r.handles(path)) else {
            debug!(file = %path.display(), "no reader for file, skipping");
            summary.skipped += 1;
            continue;
        };

        match import_document(conn, path, reader.as_ref()) {
            Ok(invoice) => {
                summary.processed += 1;
                debug!(file = %path.display(), number = invoice.number, "imported invoice");

                if summary.processed % PROGRESS_INTERVAL == 0 {
                    info!("Processed {} invoices...", summary.processed);
                }
            }
            Err(e) => {
                warn!(file = %path.display(), "failed to import invoice: {:#}", e);
                summary.failures.push(ImportFailure {
                    file: path.clone(),
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    info!(
        processed = summary.processed,
        failed = summary.failures.len(),
        skipped = summary.skipped,
        "invoice import finished"
    );

    Ok(summary)
}

// ============================================================================
// TESTS
// ============================================================================
