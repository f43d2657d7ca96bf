//! Bank Scrape - CLI tool turning statement PDFs into table-ready CSV.

use bank_scrape::batch::{parse_files, Batch, BatchPolicy};
use bank_scrape::csv_export::CsvTable;
use bank_scrape::extract::{LineSource, PdfText, PlainText};
use bank_scrape::normalize::format_grouped;
use bank_scrape::{Format, Result};
use clap::Parser;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bank_scrape")]
#[command(about = "Parse Indonesian bank statements (BCA credit, BCA debit, Jenius credit) into CSV", long_about = None)]
struct Cli {
    /// Statement files, processed in the given order
    #[arg(required_unless_present = "schema")]
    files: Vec<PathBuf>,

    /// Statement format (bca-credit, bca-credit-dual, bca-debit, jenius-credit)
    #[arg(short, long)]
    format: String,

    /// Password of encrypted PDF statements
    #[arg(short, long, env = "BANK_SCRAPE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Output file path (or stdout if not provided)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Treat inputs as already extracted plain text instead of PDF
    #[arg(long)]
    text: bool,

    /// Skip files that fail to parse instead of aborting the batch
    #[arg(long)]
    keep_going: bool,

    /// Print the target table and its columns, then exit
    #[arg(long)]
    schema: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bank_scrape=info")))
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.parse::<Format>()?;

    if cli.schema {
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", format.table_name())?;
        for column in format.columns() {
            writeln!(stdout, "  {} {}", column.name, column.sql_type)?;
        }
        return Ok(());
    }

    let policy = if cli.keep_going {
        BatchPolicy::SkipFailedFiles
    } else {
        BatchPolicy::AbortOnError
    };
    let password = cli.password.as_deref();

    let batch = if cli.text {
        run_batch(&PlainText, format, &cli.files, password, policy)?
    } else {
        run_batch(&PdfText, format, &cli.files, password, policy)?
    };

    let table = CsvTable::new(format.columns(), &batch.records);
    if let Some(ref output_path) = cli.output {
        let mut file = File::create(output_path)?;
        table.write_to(&mut file)?;
    } else {
        let mut stdout = io::stdout();
        table.write_to(&mut stdout)?;
    }

    Ok(())
}

fn run_batch<L: LineSource>(
    source: &L,
    format: Format,
    files: &[PathBuf],
    password: Option<&str>,
    policy: BatchPolicy,
) -> Result<Batch> {
    let batch = parse_files(source, format, files, password, policy)?;

    let (credits, debits): (Vec<Decimal>, Vec<Decimal>) = batch
        .records
        .iter()
        .map(|r| r.amount)
        .partition(|amount| amount.is_sign_positive());

    tracing::info!(
        "{} records into {}: credits {}, debits {}",
        batch.records.len(),
        format.table_name(),
        format_grouped(credits.iter().sum(), ',', '.'),
        format_grouped(debits.iter().sum(), ',', '.'),
    );
    if !batch.failures.is_empty() {
        tracing::warn!("{} of {} files skipped", batch.failures.len(), files.len());
    }

    Ok(batch)
}
