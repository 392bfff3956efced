use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use debt_reconciliation::pipeline::{find_debtors, import_invoices};
use debt_reconciliation::report::{render_json, render_table};
use debt_reconciliation::Config;

/// Find clients whose invoices are not fully paid
#[derive(Parser)]
#[command(name = "find-debtors")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Folder with invoice documents (.pdf, .txt)
    #[arg(long, env = "DEBTORS_INVOICES_DIR", global = true)]
    invoices: Option<PathBuf>,

    /// SQLite file for extracted invoices
    #[arg(long, env = "DEBTORS_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Bank transaction export (CSV, `;`-separated)
    #[arg(long, env = "DEBTORS_PAYMENTS", global = true)]
    payments: Option<PathBuf>,

    /// Currency shown in the report
    #[arg(long, env = "DEBTORS_CURRENCY", global = true)]
    currency: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract invoices from documents into the database
    Import,

    /// Match payments to invoices and print the debtors (default)
    Report {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn config(&self) -> Config {
        let defaults = Config::default();
        Config {
            invoices_dir: self.invoices.clone().unwrap_or(defaults.invoices_dir),
            database_path: self.database.clone().unwrap_or(defaults.database_path),
            payments_path: self.payments.clone().unwrap_or(defaults.payments_path),
            currency: self.currency.clone().unwrap_or(defaults.currency),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = cli.config();

    match cli.command {
        Some(Commands::Import) => run_import(&config),
        Some(Commands::Report { json }) => run_report(&config, json),
        None => run_report(&config, false),
    }
}

/// RUST_LOG wins; otherwise the -v count picks the level
fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set up logging: {}", e))?;

    Ok(())
}

fn run_import(config: &Config) -> Result<()> {
    println!("📂 Importing invoices from {}", config.invoices_dir.display());

    let summary = import_invoices(config)?;

    for failure in &summary.failures {
        eprintln!("❌ {}: {}", failure.file.display(), failure.reason);
    }

    println!(
        "✓ Imported {} invoices into {}",
        summary.processed,
        config.database_path.display()
    );
    if !summary.failures.is_empty() {
        println!("✗ Failed: {}", summary.failures.len());
    }

    Ok(())
}

fn run_report(config: &Config, json: bool) -> Result<()> {
    let report = find_debtors(config)?;

    if json {
        println!("{}", render_json(&report.debtors)?);
    } else {
        print!("{}", render_table(&report.debtors, &config.currency));
    }

    Ok(())
}
