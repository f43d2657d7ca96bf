//! Bank Scrape Library
//!
//! Turns the extracted text of Indonesian bank statement PDFs into typed
//! transaction records ready to be loaded into a table.
//!
//! # Supported Formats
//!
//! - **BCA credit card**: one date kept per transaction, multi-line
//!   descriptions, `CR`-suffixed credits
//! - **BCA credit card (dual date)**: transaction and posting dates, blocks
//!   that may open without a card line
//! - **BCA debit**: blank-line/footer delimited rows with the amount embedded
//!   in the description text
//! - **Jenius credit card**: label-driven layout, one field per line
//!
//! Every parser cross-checks the number of transactions it produced against
//! the number of lines that look like a transaction start and rejects the
//! whole file when they differ.
//!
//! # Examples
//!
//! ## Parsing extracted lines
//!
//! ```
//! use bank_scrape::Format;
//!
//! let lines = [
//!     "TANGGAL REKENING : 15 JANUARI 2024",
//!     "1234-56XX-XXXX-7890 JOHN DOE",
//!     "01-DES 02-DES Coffee Shop 50.000",
//! ];
//! let parsed = Format::BcaCredit.parse_lines(&lines)?;
//! assert_eq!(parsed.records[0].transaction_date.to_string(), "2023-12-01");
//! # Ok::<(), bank_scrape::Error>(())
//! ```
//!
//! ## Parsing a batch of PDF files
//!
//! ```no_run
//! use bank_scrape::batch::{parse_files, BatchPolicy};
//! use bank_scrape::extract::PdfText;
//! use bank_scrape::Format;
//!
//! let files = ["statement-jan.pdf", "statement-feb.pdf"];
//! let batch = parse_files(&PdfText, Format::BcaDebit, &files, Some("secret"), BatchPolicy::AbortOnError)?;
//! println!("{} transactions", batch.records.len());
//! # Ok::<(), bank_scrape::Error>(())
//! ```

pub mod error;
pub mod types;
pub mod normalize;
pub mod bca_credit;
pub mod bca_debit;
pub mod jenius_credit;
pub mod extract;
pub mod batch;
pub mod csv_export;

use std::str::FromStr;

use bca_credit::{BcaCreditStatement, CreditLayout};
use bca_debit::BcaDebitStatement;
use jenius_credit::JeniusCreditStatement;
use types::{
    AMOUNT, CARD_NUMBER, DESCRIPTION, ORDER, OWNER, POSTING_DATE, SETTLEMENT_DATE, TRANSACTION_DATE,
};

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::{Column, ColumnType, Field, OrderScheme, TransactionRecord};

const CREDIT_COLUMNS: [Column; 7] = [
    SETTLEMENT_DATE,
    CARD_NUMBER,
    OWNER,
    TRANSACTION_DATE,
    DESCRIPTION,
    AMOUNT,
    ORDER,
];

const CREDIT_DUAL_COLUMNS: [Column; 8] = [
    SETTLEMENT_DATE,
    CARD_NUMBER,
    OWNER,
    TRANSACTION_DATE,
    POSTING_DATE,
    DESCRIPTION,
    AMOUNT,
    ORDER,
];

const DEBIT_COLUMNS: [Column; 6] = [
    SETTLEMENT_DATE,
    CARD_NUMBER,
    TRANSACTION_DATE,
    DESCRIPTION,
    AMOUNT,
    ORDER,
];

/// Supported statement formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// BCA credit card statement
    BcaCredit,
    /// BCA credit card statement keeping the posting date
    BcaCreditDual,
    /// BCA savings account statement
    BcaDebit,
    /// Jenius credit card statement
    JeniusCredit,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bca-credit" | "bca_credit" => Ok(Format::BcaCredit),
            "bca-credit-dual" | "bca_credit_dual" => Ok(Format::BcaCreditDual),
            "bca-debit" | "bca_debit" => Ok(Format::BcaDebit),
            "jenius-credit" | "jenius_credit" | "jenius" => Ok(Format::JeniusCredit),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

/// The records of one statement file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    /// Records in statement order.
    pub records: Vec<TransactionRecord>,

    /// Transaction rows validated in the file, including rows that were
    /// parsed but not emitted (the debit opening balance).
    pub transaction_count: usize,
}

impl Format {
    /// Target table of this format. Jenius statements share the BCA credit
    /// card table.
    pub fn table_name(&self) -> &'static str {
        match self {
            Format::BcaCredit | Format::JeniusCredit => "public.stmt_bca_credit",
            Format::BcaCreditDual => "public.stmt_bca_credit_dual",
            Format::BcaDebit => "public.stmt_bca_debit",
        }
    }

    /// Ordered column-name to SQL-type mapping of the target table.
    pub fn columns(&self) -> &'static [Column] {
        match self {
            Format::BcaCredit | Format::JeniusCredit => &CREDIT_COLUMNS,
            Format::BcaCreditDual => &CREDIT_DUAL_COLUMNS,
            Format::BcaDebit => &DEBIT_COLUMNS,
        }
    }

    /// How this format numbers the `order` column.
    pub fn order_scheme(&self) -> OrderScheme {
        match self {
            Format::BcaCredit | Format::BcaDebit => OrderScheme::BatchSequence,
            Format::BcaCreditDual => OrderScheme::FileSequence,
            Format::JeniusCredit => OrderScheme::LineIndex,
        }
    }

    /// Parse the extracted lines of one statement file.
    pub fn parse_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<ParsedFile> {
        let records = match self {
            Format::BcaCredit => BcaCreditStatement::from_lines(lines, CreditLayout::SingleDate)?.records,
            Format::BcaCreditDual => BcaCreditStatement::from_lines(lines, CreditLayout::DualDate)?.records,
            Format::JeniusCredit => JeniusCreditStatement::from_lines(lines)?.records,
            Format::BcaDebit => {
                let statement = BcaDebitStatement::from_lines(lines)?;
                return Ok(ParsedFile {
                    records: statement.records,
                    transaction_count: statement.transaction_count,
                });
            }
        };

        Ok(ParsedFile {
            transaction_count: records.len(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_from_str() {
        assert_eq!("bca-credit".parse::<Format>().unwrap(), Format::BcaCredit);
        assert_eq!("BCA_DEBIT".parse::<Format>().unwrap(), Format::BcaDebit);
        assert_eq!("bca-credit-dual".parse::<Format>().unwrap(), Format::BcaCreditDual);
        assert_eq!("jenius".parse::<Format>().unwrap(), Format::JeniusCredit);
        assert!("mandiri".parse::<Format>().is_err());
    }

    #[test]
    fn test_columns() {
        let names = |format: Format| format.columns().iter().map(|c| c.name).collect::<Vec<_>>();

        assert_eq!(
            names(Format::BcaCredit),
            vec!["settlement_date", "card_number", "owner", "transaction_date", "description", "amount", "order"]
        );
        assert!(names(Format::BcaCreditDual).contains(&"posting_date"));
        assert!(!names(Format::BcaDebit).contains(&"owner"));
        assert_eq!(Format::BcaDebit.table_name(), "public.stmt_bca_debit");
    }

    #[test]
    fn test_debit_transaction_count_includes_opening_balance() {
        let lines = [
            "NO. REKENING : 5500002095",
            "PERIODE : FEBRUARI 2024",
            "01/02 SALDO AWAL 12,500,000.00",
            "02/02 BUNGA 1,234.56",
        ];
        let parsed = Format::BcaDebit.parse_lines(&lines).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.transaction_count, 2);
    }
}
