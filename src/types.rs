//! Common types shared by the statement parsers.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header state of the statement currently being read.
///
/// Filled in as header lines are recognized; every transaction is stamped
/// with the values current at the time it is finished.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementContext {
    /// Billing date (credit cards) or first day of the period (debit).
    pub settlement_date: Option<NaiveDate>,

    /// Masked card number or account number.
    pub card_number: Option<String>,

    /// Card holder name, credit statements only.
    pub owner: Option<String>,
}

impl StatementContext {
    /// Settlement date and card number, or the error naming what is missing.
    pub fn require_header(&self, line: &str) -> Result<(NaiveDate, &str)> {
        let card_number = self.card_number.as_deref().ok_or_else(|| Error::HeaderMissing {
            missing: "card number",
            line: line.to_string(),
        })?;
        let settlement_date = self.settlement_date.ok_or_else(|| Error::HeaderMissing {
            missing: "settlement date",
            line: line.to_string(),
        })?;
        Ok((settlement_date, card_number))
    }
}

/// A transaction still being assembled from raw text.
///
/// All fields hold the text as it appeared on the statement; typing happens
/// once the draft is complete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionDraft {
    /// Date token without year (`01-DES`, `01/02`, `5 Jan 2024`).
    pub transaction_date_raw: String,

    /// Second date token, dual-date credit statements only.
    pub posting_date_raw: Option<String>,

    /// Description fragments in source order.
    pub fragments: Vec<String>,

    /// Amount token including its credit/debit marker.
    pub amount_raw: Option<String>,
}

impl TransactionDraft {
    /// Start a draft from a date token and the first piece of description.
    pub fn new(transaction_date_raw: impl Into<String>, first_fragment: impl Into<String>) -> Self {
        Self {
            transaction_date_raw: transaction_date_raw.into(),
            fragments: vec![first_fragment.into()],
            ..Self::default()
        }
    }

    /// Append a continuation line to the description.
    pub fn push_fragment(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    /// Fragments joined by single spaces.
    pub fn joined(&self) -> String {
        self.fragments.join(" ")
    }
}

/// A finalized, typed transaction ready to be loaded into a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Statement billing/period date.
    pub settlement_date: NaiveDate,

    /// Card or account number.
    pub card_number: String,

    /// Card holder, credit statements only.
    pub owner: Option<String>,

    /// Transaction date with the year resolved.
    pub transaction_date: NaiveDate,

    /// Posting date, dual-date credit statements only.
    pub posting_date: Option<NaiveDate>,

    /// Whitespace-normalized description.
    pub description: String,

    /// Negative for charges and debits, positive for credits.
    pub amount: Decimal,

    /// Stable sort key within the output; see [`OrderScheme`].
    pub order: usize,
}

impl TransactionRecord {
    /// Render the value of one output column.
    pub fn column_value(&self, column: &Column) -> String {
        match column.field {
            Field::SettlementDate => self.settlement_date.to_string(),
            Field::CardNumber => self.card_number.clone(),
            Field::Owner => self.owner.clone().unwrap_or_default(),
            Field::TransactionDate => self.transaction_date.to_string(),
            Field::PostingDate => self.posting_date.map(|d| d.to_string()).unwrap_or_default(),
            Field::Description => self.description.clone(),
            Field::Amount => self.amount.to_string(),
            Field::Order => self.order.to_string(),
        }
    }
}

/// How the `order` column is numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScheme {
    /// 0-based, continuing across every file of a batch.
    BatchSequence,
    /// 1-based, restarting for every file.
    FileSequence,
    /// Index of the source line the transaction's amount was read from.
    LineIndex,
}

/// SQL column types of the target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Date,
    VarChar(u16),
    Text,
    Decimal,
    SmallInt,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Date => write!(f, "DATE"),
            ColumnType::VarChar(len) => write!(f, "VARCHAR({})", len),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Decimal => write!(f, "DECIMAL"),
            ColumnType::SmallInt => write!(f, "SMALLINT"),
        }
    }
}

/// The [`TransactionRecord`] field a column is filled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SettlementDate,
    CardNumber,
    Owner,
    TransactionDate,
    PostingDate,
    Description,
    Amount,
    Order,
}

/// One column of the target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: ColumnType,
    pub field: Field,
}

impl Column {
    const fn new(name: &'static str, sql_type: ColumnType, field: Field) -> Self {
        Self { name, sql_type, field }
    }
}

pub const SETTLEMENT_DATE: Column = Column::new("settlement_date", ColumnType::Date, Field::SettlementDate);
pub const CARD_NUMBER: Column = Column::new("card_number", ColumnType::VarChar(19), Field::CardNumber);
pub const OWNER: Column = Column::new("owner", ColumnType::VarChar(255), Field::Owner);
pub const TRANSACTION_DATE: Column = Column::new("transaction_date", ColumnType::Date, Field::TransactionDate);
pub const POSTING_DATE: Column = Column::new("posting_date", ColumnType::Date, Field::PostingDate);
pub const DESCRIPTION: Column = Column::new("description", ColumnType::Text, Field::Description);
pub const AMOUNT: Column = Column::new("amount", ColumnType::Decimal, Field::Amount);
pub const ORDER: Column = Column::new("order", ColumnType::SmallInt, Field::Order);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_require_header_names_missing_field() {
        let mut ctx = StatementContext::default();
        let err = ctx.require_header("01-DES 02-DES X").unwrap_err();
        assert!(matches!(err, Error::HeaderMissing { missing: "card number", .. }));

        ctx.card_number = Some("1234-56XX-XXXX-7890".into());
        let err = ctx.require_header("01-DES 02-DES X").unwrap_err();
        assert!(matches!(err, Error::HeaderMissing { missing: "settlement date", .. }));

        ctx.settlement_date = NaiveDate::from_ymd_opt(2024, 1, 15);
        let (date, card) = ctx.require_header("01-DES 02-DES X").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(card, "1234-56XX-XXXX-7890");
    }

    #[test]
    fn test_draft_joins_in_order() {
        let mut draft = TransactionDraft::new("01/02", "TRANSFER");
        draft.push_fragment("OUT");
        draft.push_fragment("KE 123");
        assert_eq!(draft.joined(), "TRANSFER OUT KE 123");
    }

    #[test]
    fn test_column_type_display() {
        assert_eq!(CARD_NUMBER.sql_type.to_string(), "VARCHAR(19)");
        assert_eq!(ORDER.sql_type.to_string(), "SMALLINT");
    }

    #[test]
    fn test_column_value_follows_field() {
        let record = TransactionRecord {
            settlement_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            card_number: "1234-56XX-XXXX-7890".into(),
            owner: None,
            transaction_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            posting_date: None,
            description: "HOTEL".into(),
            amount: Decimal::new(-150000, 2),
            order: 3,
        };

        // The header name does not drive the lookup.
        let renamed = Column { name: "amt", ..AMOUNT };
        assert_eq!(record.column_value(&renamed), "-1500.00");
        assert_eq!(record.column_value(&TRANSACTION_DATE), "2023-12-31");
        assert_eq!(record.column_value(&OWNER), "");
        assert_eq!(record.column_value(&ORDER), "3");
    }
}
