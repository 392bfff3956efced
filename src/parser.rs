// 🏦 Payment Feed Parser
// Reads the bank's transaction export into PaymentRecord rows

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

// ============================================================================
// CORE TYPES
// ============================================================================

/// PaymentRecord - One row of the bank transaction feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Payer (or payee) name as the bank wrote it
    pub payer: String,
    /// Payment date, as it appears in the feed
    pub date: String,
    /// Free-text description, usually cites the invoice
    pub description: String,
    /// Signed amount (debit negative, credit positive)
    pub amount: f64,
    pub currency: String,
}

impl PaymentRecord {
    pub fn new(payer: &str, date: &str, description: &str, amount: f64, currency: &str) -> Self {
        PaymentRecord {
            payer: payer.to_string(),
            date: date.to_string(),
            description: description.to_string(),
            amount,
            currency: currency.to_string(),
        }
    }
}

/// Raw CSV row. Amount stays a string until we know the decimal separator.
#[derive(Debug, Deserialize)]
struct RawPaymentRow {
    #[serde(rename = "Saaja/Maksja")]
    payer: String,

    #[serde(rename = "Kuupäev")]
    date: String,

    #[serde(rename = "Selgitus")]
    description: String,

    #[serde(rename = "Summa")]
    amount: String,

    #[serde(rename = "Valuuta")]
    currency: String,
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// PaymentParser - Turns a transaction export into payment records
///
/// Rows are returned in file order; the reconciliation fallback depends on it.
pub trait PaymentParser {
    /// Parse payments from any reader (file, in-memory buffer)
    fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<PaymentRecord>>;

    /// Parse a file on disk
    fn parse(&self, file_path: &Path) -> Result<Vec<PaymentRecord>> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

        self.parse_reader(file)
            .with_context(|| format!("Failed to parse payments from {}", file_path.display()))
    }
}

/// Bank CSV export: `;`-separated, Estonian headers, decimal comma amounts
///
/// Header columns used: Saaja/Maksja, Kuupäev, Selgitus, Summa, Valuuta.
/// Everything else (Deebet/Kreedit, account numbers, ...) is ignored.
pub struct BankCsvParser;

const FIELD_DELIMITER: u8 = b';';

impl BankCsvParser {
    pub fn new() -> Self {
        BankCsvParser
    }
}

impl Default for BankCsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentParser for BankCsvParser {
    fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<PaymentRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(FIELD_DELIMITER)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let mut payments = Vec::new();

        for (line_num, result) in reader.deserialize::<RawPaymentRow>().enumerate() {
            // +2 because: 1-indexed + header row
            let line = line_num + 2;
            let row = result.with_context(|| format!("Failed to parse CSV line {}", line))?;

            let amount = parse_amount(&row.amount).with_context(|| {
                format!("Invalid amount {:?} on CSV line {}", row.amount, line)
            })?;

            payments.push(PaymentRecord {
                payer: row.payer,
                date: row.date,
                description: row.description,
                amount,
                currency: row.currency,
            });
        }

        debug!(count = payments.len(), "parsed payment feed");
        Ok(payments)
    }
}

/// Parse an amount that may use a decimal comma ("12,50") or point ("12.50")
pub fn parse_amount(raw: &str) -> Result<f64> {
    let normalized = raw.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .with_context(|| format!("Not a number: {:?}", raw))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const FEED: &str = "\
Kuupäev;Saaja/Maksja;Selgitus;Summa;Valuuta;Deebet/Kreedit
02.01.2025;Tamm Mart;Arve nr 10;60,00;EUR;K
03.01.2025;MAASIKAS, MARI;aitäh;50;EUR;K
04.01.2025;Pank;Teenustasu;-1,25;EUR;D
";

    #[test]
    fn test_parse_reader() {
        let parser = BankCsvParser::new();
        let payments = parser.parse_reader(FEED.as_bytes()).unwrap();

        assert_eq!(payments.len(), 3);
        assert_eq!(
            payments[0],
            PaymentRecord::new("Tamm Mart", "02.01.2025", "Arve nr 10", 60.0, "EUR")
        );
        assert_eq!(payments[1].payer, "MAASIKAS, MARI");
        assert_eq!(payments[1].amount, 50.0);
        assert_eq!(payments[2].amount, -1.25);
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FEED.as_bytes()).unwrap();

        let payments = BankCsvParser::new().parse(file.path()).unwrap();
        assert_eq!(payments.len(), 3);
    }

    #[test]
    fn test_invalid_amount_reports_line() {
        let feed = "Kuupäev;Saaja/Maksja;Selgitus;Summa;Valuuta\n\
                    02.01.2025;Tamm Mart;Arve 1;10;EUR\n\
                    03.01.2025;Tamm Mart;Arve 2;kümme;EUR\n";

        let err = BankCsvParser::new().parse_reader(feed.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"), "got: {:#}", err);
    }

    #[test]
    fn test_missing_column_fails() {
        let feed = "Kuupäev;Saaja/Maksja;Summa\n02.01.2025;Tamm Mart;10\n";
        assert!(BankCsvParser::new().parse_reader(feed.as_bytes()).is_err());
    }

    #[test]
    fn test_comma_separated_feed_is_rejected() {
        // Only `;` separates fields, so the whole header is one unknown column
        let feed = "Kuupäev,Saaja/Maksja,Selgitus,Summa,Valuuta\n02.01.2025,Tamm Mart,Arve 1,10.5,EUR\n";
        assert!(BankCsvParser::new().parse_reader(feed.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12,50").unwrap(), 12.5);
        assert_eq!(parse_amount(" 7 ").unwrap(), 7.0);
        assert_eq!(parse_amount("-3.25").unwrap(), -3.25);
        assert!(parse_amount("").is_err());
    }
}
