//! BCA debit (savings account) statement parser.
//!
//! Expected extracted-text section:
//!
//! ```text
//! NO. REKENING : 5500002095
//! PERIODE : FEBRUARI 2024
//! 01/02 SALDO AWAL 12,500,000.00
//! 01/02 TRSF E-BANKING DB 0102/FTSCY/WS95051 1,000,000.00 DB 11,500,000.00
//! ANDI
//! Bersambung ke Halaman berikut
//! ```
//!
//! A transaction starts at a `DD/MM` line and runs until a blank line, a
//! page/document footer, or the next `DD/MM` line. The amount is not in a
//! fixed column: it is searched for in the joined description text.

use crate::error::{Error, Result};
use crate::normalize::{clean_line, parse_grouped_amount, parse_period, MonthCase};
use crate::types::{StatementContext, TransactionDraft, TransactionRecord};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Lines starting with any of these close the pending transaction.
const TRANSACTION_END_MARKERS: [&str; 3] = [
    "Bersambung ke Halaman berikut",
    "Bersambung ke halaman berikut",
    "SALDO AWAL :",
];

/// Description of the opening-balance row, which is not a transaction.
const OPENING_BALANCE: &str = "SALDO AWAL";

fn account_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"NO\. REKENING :\s*([0-9]+)$").expect("account regex"))
}

fn period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^PERIODE :\s*([A-Z]+ \d{4})$").expect("period regex"))
}

fn transaction_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2}/\d{2}) (.*)").expect("transaction start regex"))
}

// Group 1 is the amount; the leading `(?:^|\D)` keeps it from starting
// in the middle of a longer number.
fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\D)(\d{1,3}(?:,\d{3})*\.\d{1,2}(?: DB)?)").expect("amount regex"))
}

fn balance_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\D)(\d{1,3}(?:,\d{3})*\.\d{2})$").expect("balance regex"))
}

fn validation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}").expect("validation regex"))
}

/// Split the amount token out of a transaction's description fragments.
///
/// The amount is the first amount-shaped token of the joined text. It is
/// removed from the first and last fragments only, together with a trailing
/// running balance, and the remaining text is re-normalized.
///
/// When the description ends in digits printed directly against the amount
/// (`SOME DESCRIPTION 99910,000,000.00 DB`) the split point is ambiguous and
/// the amount comes out as zero.
pub fn split_description_and_amount(fragments: &[String]) -> Result<(String, String)> {
    let joined = fragments.join(" ");
    let amount = amount_re()
        .captures(&joined)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::AmountNotFound {
            description: joined.clone(),
        })?;

    let mut fragments = fragments.to_vec();
    let last = fragments.len().saturating_sub(1);
    for i in [0, last] {
        if let Some(fragment) = fragments.get_mut(i) {
            *fragment = fragment.replace(&amount, "");
        }
    }
    for i in [0, last] {
        if let Some(fragment) = fragments.get_mut(i) {
            if let Some(balance) = balance_re().captures(fragment).and_then(|caps| caps.get(1)) {
                let start = balance.start();
                fragment.truncate(start);
            }
        }
    }

    Ok((clean_line(&fragments.join(" ")), amount))
}

#[derive(Debug, Clone, PartialEq)]
enum DebitState {
    SeekingHeader,
    AwaitingTransaction,
    Accumulating(TransactionDraft),
}

#[derive(Debug, Clone, PartialEq)]
struct RawRow {
    settlement_date: NaiveDate,
    card_number: String,
    transaction_date_raw: String,
    description: String,
    amount_raw: String,
}

struct Step {
    next: DebitState,
    emitted: Option<RawRow>,
}

impl Step {
    fn stay(next: DebitState) -> Self {
        Step { next, emitted: None }
    }
}

/// Blank lines and page/document footers end a transaction.
fn is_terminator(line: &str) -> bool {
    line.is_empty() || TRANSACTION_END_MARKERS.iter().any(|m| line.starts_with(m))
}

fn start_draft(ctx: &StatementContext, line: &str) -> Result<Option<TransactionDraft>> {
    match transaction_start_re().captures(line) {
        Some(caps) => {
            ctx.require_header(line)?;
            Ok(Some(TransactionDraft::new(&caps[1], &caps[2])))
        }
        None => Ok(None),
    }
}

fn close_draft(ctx: &StatementContext, draft: TransactionDraft) -> Result<RawRow> {
    let (settlement_date, card_number) = ctx.require_header(&draft.joined())?;
    let (description, amount_raw) = split_description_and_amount(&draft.fragments)?;
    Ok(RawRow {
        settlement_date,
        card_number: card_number.to_string(),
        transaction_date_raw: draft.transaction_date_raw,
        description,
        amount_raw,
    })
}

fn awaiting_transaction(ctx: &StatementContext, line: &str) -> Result<Step> {
    let next = match start_draft(ctx, line)? {
        Some(draft) => DebitState::Accumulating(draft),
        None => DebitState::AwaitingTransaction,
    };
    Ok(Step::stay(next))
}

fn accumulating(ctx: &StatementContext, mut draft: TransactionDraft, line: &str) -> Result<Step> {
    if is_terminator(line) {
        return Ok(Step {
            next: DebitState::AwaitingTransaction,
            emitted: Some(close_draft(ctx, draft)?),
        });
    }

    if transaction_start_re().is_match(line) {
        let emitted = close_draft(ctx, draft)?;
        let next = match start_draft(ctx, line)? {
            Some(draft) => DebitState::Accumulating(draft),
            None => DebitState::AwaitingTransaction,
        };
        return Ok(Step {
            next,
            emitted: Some(emitted),
        });
    }

    draft.push_fragment(line);
    Ok(Step::stay(DebitState::Accumulating(draft)))
}

/// Line-by-line state machine for one debit statement file.
#[derive(Debug, Clone)]
pub struct DebitParser {
    ctx: StatementContext,
    state: DebitState,
    rows: Vec<RawRow>,
    expected: usize,
}

impl Default for DebitParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DebitParser {
    pub fn new() -> Self {
        Self {
            ctx: StatementContext::default(),
            state: DebitState::SeekingHeader,
            rows: Vec::new(),
            expected: 0,
        }
    }

    /// Consume one raw line.
    ///
    /// Header lines are recognized in every state, so a page header repeated
    /// inside a transaction does not close it.
    pub fn feed(&mut self, raw: &str) -> Result<()> {
        let line = clean_line(raw);

        if validation_re().is_match(&line) {
            self.expected += 1;
        }

        if let Some(caps) = period_re().captures(&line) {
            self.ctx.settlement_date = Some(parse_period(&caps[1], MonthCase::Upper)?);
            return Ok(());
        }

        if let Some(caps) = account_number_re().captures(&line) {
            self.ctx.card_number = Some(caps[1].to_string());
            if self.state == DebitState::SeekingHeader {
                self.state = DebitState::AwaitingTransaction;
            }
            return Ok(());
        }

        let state = std::mem::replace(&mut self.state, DebitState::SeekingHeader);
        let step = match state {
            DebitState::SeekingHeader => Step::stay(DebitState::SeekingHeader),
            DebitState::AwaitingTransaction => awaiting_transaction(&self.ctx, &line)?,
            DebitState::Accumulating(draft) => accumulating(&self.ctx, draft, &line)?,
        };

        self.state = step.next;
        if let Some(row) = step.emitted {
            self.rows.push(row);
        }
        Ok(())
    }

    /// Close the last transaction, validate the count and type every row.
    ///
    /// Orders are 0-based in statement order and are assigned before the
    /// opening-balance row is dropped.
    pub fn finish(mut self) -> Result<BcaDebitStatement> {
        let state = std::mem::replace(&mut self.state, DebitState::AwaitingTransaction);
        if let DebitState::Accumulating(draft) = state {
            self.rows.push(close_draft(&self.ctx, draft)?);
        }

        if self.rows.len() != self.expected {
            return Err(Error::ValidationCountMismatch {
                emitted: self.rows.len(),
                expected: self.expected,
            });
        }

        let transaction_count = self.rows.len();
        let mut records = Vec::with_capacity(transaction_count);
        for (order, row) in self.rows.into_iter().enumerate() {
            if row.description == OPENING_BALANCE {
                continue;
            }
            records.push(into_record(row, order)?);
        }

        Ok(BcaDebitStatement {
            records,
            transaction_count,
        })
    }
}

fn into_record(row: RawRow, order: usize) -> Result<TransactionRecord> {
    let (day, month) = row
        .transaction_date_raw
        .split_once('/')
        .ok_or_else(|| Error::InvalidDate(row.transaction_date_raw.clone()))?;
    let day: u32 = day.parse().map_err(|_| Error::InvalidDate(row.transaction_date_raw.clone()))?;
    let month: u32 = month.parse().map_err(|_| Error::InvalidDate(row.transaction_date_raw.clone()))?;
    let transaction_date = NaiveDate::from_ymd_opt(row.settlement_date.year(), month, day)
        .ok_or_else(|| Error::InvalidDate(row.transaction_date_raw.clone()))?;

    Ok(TransactionRecord {
        settlement_date: row.settlement_date,
        card_number: row.card_number,
        owner: None,
        transaction_date,
        posting_date: None,
        description: row.description,
        amount: parse_grouped_amount(&row.amount_raw, " DB", false)?,
        order,
    })
}

/// Represents a parsed debit statement file.
#[derive(Debug, Clone, PartialEq)]
pub struct BcaDebitStatement {
    /// The transactions in statement order, opening balance excluded.
    pub records: Vec<TransactionRecord>,

    /// Number of transaction rows found, opening balance included.
    pub transaction_count: usize,
}

impl BcaDebitStatement {
    /// Parse the extracted lines of one statement file.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let mut parser = DebitParser::new();
        for line in lines {
            parser.feed(line.as_ref())?;
        }
        parser.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parse(body: &[&str]) -> Result<BcaDebitStatement> {
        let header = ["REKENING TAHAPAN", "NO. REKENING : 5500002095", "PERIODE : FEBRUARI 2024"];
        let lines: Vec<&str> = header.iter().chain(body).copied().collect();
        BcaDebitStatement::from_lines(&lines)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_transfer_closed_by_blank_line() {
        let statement = parse(&["01/02 TRANSFER OUT", "1,000,000.00 DB", ""]).unwrap();

        assert_eq!(
            statement.records,
            vec![TransactionRecord {
                settlement_date: date(2024, 2, 1),
                card_number: "5500002095".into(),
                owner: None,
                transaction_date: date(2024, 2, 1),
                posting_date: None,
                description: "TRANSFER OUT".into(),
                amount: Decimal::from(-1000000),
                order: 0,
            }]
        );
    }

    #[test]
    fn test_account_label_mid_line_and_repeated_page_header() {
        let lines = [
            "REKENING TAHAPAN NO. REKENING : 5500002095",
            "PERIODE : FEBRUARI 2024",
            "01/02 TRSF KE ANDI",
            "NO. REKENING : 5500002095",
            "1,000.00 DB",
            "",
        ];
        let statement = BcaDebitStatement::from_lines(&lines).unwrap();

        assert_eq!(statement.records.len(), 1);
        assert_eq!(statement.records[0].card_number, "5500002095");
        assert_eq!(statement.records[0].description, "TRSF KE ANDI");
        assert_eq!(statement.records[0].amount, Decimal::from_str("-1000.00").unwrap());
    }

    #[test]
    fn test_whitespace_only_line_closes_transaction() {
        let statement = parse(&["01/02 TRANSFER OUT", "1,000,000.00 DB", " \t ", "ignored trailer"]).unwrap();
        assert_eq!(statement.records[0].description, "TRANSFER OUT");
    }

    #[test]
    fn test_credit_with_running_balance() {
        let statement = parse(&["02/02 SETORAN TUNAI 500,000.00 1,750,000.00", "03/02 BUNGA 1,234.56"]).unwrap();
        let records = statement.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "SETORAN TUNAI");
        assert_eq!(records[0].amount, Decimal::from(500000));
        assert_eq!(records[1].description, "BUNGA");
        assert_eq!(records[1].amount, Decimal::from_str("1234.56").unwrap());
    }

    #[test]
    fn test_multiline_with_amount_and_balance_on_first_line() {
        let statement = parse(&[
            "05/02 TRSF E-BANKING DB 0502/FTSCY/WS95051 250,000.00 DB 9,750,000.00",
            "ANDI WIJAYA",
            "",
        ])
        .unwrap();
        let record = &statement.records[0];
        assert_eq!(record.description, "TRSF E-BANKING DB 0502/FTSCY/WS95051 ANDI WIJAYA");
        assert_eq!(record.amount, Decimal::from(-250000));
        assert_eq!(record.transaction_date, date(2024, 2, 5));
    }

    #[test]
    fn test_footer_closes_transaction() {
        let statement = parse(&[
            "03/02 BIAYA ADM",
            "10,000.00 DB",
            "Bersambung ke Halaman berikut",
            "TANGGAL KETERANGAN CBG MUTASI SALDO",
            "04/02 KR OTOMATIS 75,000.00",
            "SALDO AWAL : 12,500,000.00",
        ])
        .unwrap();
        let records = statement.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "BIAYA ADM");
        assert_eq!(records[1].description, "KR OTOMATIS");
        assert_eq!(records[1].order, 1);
    }

    #[test]
    fn test_opening_balance_is_dropped_but_keeps_its_order() {
        let statement = parse(&["01/02 SALDO AWAL 12,500,000.00", "02/02 BUNGA 1,234.56"]).unwrap();
        assert_eq!(statement.transaction_count, 2);
        assert_eq!(statement.records.len(), 1);
        assert_eq!(statement.records[0].description, "BUNGA");
        assert_eq!(statement.records[0].order, 1);
    }

    #[test]
    fn test_amount_not_found() {
        let err = parse(&["04/02 TRANSFER", ""]).unwrap_err();
        assert!(matches!(err, Error::AmountNotFound { .. }));
    }

    #[test]
    fn test_count_mismatch() {
        let err = parse(&["04/02 BUNGA 1,234.56", "05/02"]).unwrap_err();
        assert!(matches!(err, Error::ValidationCountMismatch { emitted: 1, expected: 2 }));
    }

    #[test]
    fn test_missing_period_is_fatal() {
        let lines = ["NO. REKENING : 5500002095", "01/02 BUNGA 1,234.56"];
        let err = BcaDebitStatement::from_lines(&lines).unwrap_err();
        assert!(matches!(err, Error::HeaderMissing { missing: "settlement date", .. }));
    }

    #[test]
    fn test_digits_against_amount_parse_as_zero() {
        let (description, amount) =
            split_description_and_amount(&strings(&["SOME DESCRIPTION 99910,000,000.00 DB"])).unwrap();
        assert_eq!(amount, "000,000.00 DB");
        assert_eq!(description, "SOME DESCRIPTION 99910,");
        assert!(parse_grouped_amount(&amount, " DB", false).unwrap().is_zero());
    }

    #[test]
    fn test_amount_is_removed_everywhere_in_its_fragment() {
        // The balance 1,500,000.00 contains the amount text and loses it too.
        let (description, amount) =
            split_description_and_amount(&strings(&["SETORAN 500,000.00 1,500,000.00"])).unwrap();
        assert_eq!(amount, "500,000.00");
        assert_eq!(description, "SETORAN 1,");
    }

    #[test]
    fn test_amount_in_middle_fragment_is_left_in_place() {
        let (description, amount) =
            split_description_and_amount(&strings(&["TRANSFER", "1,000.00", "ANDI"])).unwrap();
        assert_eq!(amount, "1,000.00");
        assert_eq!(description, "TRANSFER 1,000.00 ANDI");
    }
}
