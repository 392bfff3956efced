use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Invoice extracted from an issued invoice document
/// Immutable once loaded; `number` is unique across the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Invoice number (primary key)
    pub number: i64,

    /// Client name exactly as printed on the invoice
    pub client: String,

    pub issue_date: NaiveDate,

    pub due_date: NaiveDate,

    /// Billed total, never negative
    pub total: f64,
}

impl InvoiceRecord {
    pub fn new(
        number: i64,
        client: &str,
        issue_date: NaiveDate,
        due_date: NaiveDate,
        total: f64,
    ) -> Self {
        InvoiceRecord {
            number,
            client: client.to_string(),
            issue_date,
            due_date,
            total,
        }
    }
}

/// Create a fresh invoice table, dropping whatever a previous import left
pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // The store is rebuilt from the invoice documents on every import
    conn.execute("DROP TABLE IF EXISTS invoices", [])?;

    conn.execute(
        "CREATE TABLE invoices (
            number INTEGER PRIMARY KEY,
            client TEXT NOT NULL,
            issue_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            total REAL NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Insert one invoice. A duplicate invoice number is an error.
pub fn insert_invoice(conn: &Connection, invoice: &InvoiceRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO invoices (number, client, issue_date, due_date, total)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            invoice.number,
            invoice.client,
            invoice.issue_date.to_string(),
            invoice.due_date.to_string(),
            invoice.total,
        ],
    )
    .with_context(|| format!("Failed to insert invoice {}", invoice.number))?;

    debug!(number = invoice.number, client = %invoice.client, "stored invoice");
    Ok(())
}

/// All stored invoices, by invoice number
/// (`number` is the rowid, so insertion order is not kept)
pub fn get_all_invoices(conn: &Connection) -> Result<Vec<InvoiceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT number, client, issue_date, due_date, total
         FROM invoices
         ORDER BY number",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(number, client, issue_date, due_date, total)| -> Result<InvoiceRecord> {
            Ok(InvoiceRecord {
                number,
                client,
                issue_date: parse_stored_date(&issue_date)
                    .with_context(|| format!("Invoice {} has a bad issue date", number))?,
                due_date: parse_stored_date(&due_date)
                    .with_context(|| format!("Invoice {} has a bad due date", number))?,
                total,
            })
        })
        .collect()
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM invoices", [], |row| row.get(0))?;

    Ok(count)
}

fn parse_stored_date(value: &str) -> Result<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .with_context(|| format!("Not an ISO date: {:?}", value))
}
