// ⚙️ Configuration - Where the inputs and the invoice store live

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Folder with the issued invoice documents
    pub invoices_dir: PathBuf,

    /// SQLite file holding the extracted invoices
    pub database_path: PathBuf,

    /// Bank transaction export (`;`-separated CSV)
    pub payments_path: PathBuf,

    /// Currency label printed in the report footer
    pub currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            invoices_dir: PathBuf::from("invoices"),
            database_path: PathBuf::from("parsed_invoices.db"),
            payments_path: PathBuf::from("payments.csv"),
            currency: "EUR".to_string(),
        }
    }
}
