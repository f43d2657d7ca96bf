//! Jenius credit card statement parser.
//!
//! Unlike the BCA layouts, header values and transaction fields are not
//! matched inline: a fixed label line announces a value printed on the line
//! right below it, and each transaction field sits on its own line.
//!
//! ```text
//! Nomor Kartu
//! 5289 XXXX XXXX 1234
//! Pemegang Kartu
//! JOHN DOE
//! Tanggal Cetak Tagihan
//! 15 Januari 2024
//! 5 Jan 2024
//! 6 Jan 2024
//! STARBUCKS
//! JAKARTA
//! 55,000.00
//! 7 Jan 2024
//! 7 Jan 2024
//! REFUND TOKOPEDIA
//! 120,500.00
//! CR
//! Pembayaran Tagihan
//! ```

use crate::error::{Error, Result};
use crate::normalize::{clean_line, parse_grouped_amount, parse_long_date, parse_short_date, MonthCase};
use crate::types::{StatementContext, TransactionDraft, TransactionRecord};
use regex::Regex;
use std::sync::OnceLock;

const LINE_CARD_NUMBER: &str = "Nomor Kartu";
const LINE_OWNER: &str = "Pemegang Kartu";
const LINE_SETTLEMENT_DATE: &str = "Tanggal Cetak Tagihan";
const LINE_CR: &str = "CR";
/// Start of the bill payment section; nothing after it is a transaction.
const LINE_FILE_END: &str = "Pembayaran Tagihan";

fn transaction_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2} [A-Z][a-z]{2} \d{4}\b$").expect("transaction start regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,3}(,\d{3})*\.\d{2}$").expect("amount regex"))
}

#[derive(Debug, Clone, PartialEq)]
struct RawRow {
    ctx: StatementContext,
    draft: TransactionDraft,
    amount_line: usize,
}

/// Random-access view over the extracted lines with a read cursor.
struct Cursor<'a, S> {
    lines: &'a [S],
    pos: usize,
}

impl<'a, S: AsRef<str>> Cursor<'a, S> {
    fn new(lines: &'a [S]) -> Self {
        Self { lines, pos: 0 }
    }

    /// Take the next line, cleaned, with its index.
    fn next_line(&mut self) -> Option<(usize, String)> {
        let index = self.pos;
        let line = self.lines.get(index)?;
        self.pos += 1;
        Some((index, clean_line(line.as_ref())))
    }

    /// Look at the next line without consuming it.
    fn peek(&self) -> Option<String> {
        self.lines.get(self.pos).map(|line| clean_line(line.as_ref()))
    }

    /// The value printed below a label line.
    fn label_value(&mut self, field: &'static str) -> Result<String> {
        let line = self.pos;
        self.next_line()
            .map(|(_, value)| value)
            .ok_or(Error::MissingField { field, line })
    }
}

/// Read a transaction whose start line has just been consumed, up to and
/// including its amount line.
fn read_transaction<S: AsRef<str>>(cursor: &mut Cursor<'_, S>, start: String) -> Result<(TransactionDraft, usize)> {
    let mut draft = TransactionDraft {
        transaction_date_raw: start,
        ..TransactionDraft::default()
    };

    // Posting date; not part of the output.
    cursor.label_value("posting_date")?;

    loop {
        let line = cursor.pos;
        let (index, text) = cursor
            .next_line()
            .ok_or(Error::MissingField { field: "amount", line })?;

        if amount_re().is_match(&text) {
            let credit = cursor.peek().is_some_and(|next| next == LINE_CR);
            draft.amount_raw = Some(if credit { format!("{} {}", text, LINE_CR) } else { text });
            return Ok((draft, index));
        }

        draft.push_fragment(text);
    }
}

/// Represents a parsed Jenius credit card statement file.
#[derive(Debug, Clone, PartialEq)]
pub struct JeniusCreditStatement {
    /// The transactions in statement order.
    pub records: Vec<TransactionRecord>,
}

impl JeniusCreditStatement {
    /// Parse the extracted lines of one statement file.
    ///
    /// The `order` of each record is the index of the line its amount was
    /// read from.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let mut cursor = Cursor::new(lines);
        let mut ctx = StatementContext::default();
        let mut rows = Vec::new();
        let mut expected = 0;

        while let Some((_, line)) = cursor.next_line() {
            if line.is_empty() {
                continue;
            }

            if line == LINE_FILE_END {
                break;
            }

            let is_start = transaction_start_re().is_match(&line);
            if is_start {
                expected += 1;
            }

            if line == LINE_SETTLEMENT_DATE {
                let value = cursor.label_value("settlement_date")?;
                ctx.settlement_date = Some(parse_long_date(&value, MonthCase::Title)?);
            } else if line == LINE_CARD_NUMBER {
                ctx.card_number = Some(cursor.label_value("card_number")?);
            } else if line == LINE_OWNER {
                ctx.owner = Some(cursor.label_value("owner")?);
            } else if is_start {
                let (draft, amount_line) = read_transaction(&mut cursor, line)?;
                rows.push(RawRow {
                    ctx: ctx.clone(),
                    draft,
                    amount_line,
                });
            }
        }

        if rows.len() != expected {
            return Err(Error::ValidationCountMismatch {
                emitted: rows.len(),
                expected,
            });
        }

        let records = rows.into_iter().map(into_record).collect::<Result<Vec<_>>>()?;
        Ok(JeniusCreditStatement { records })
    }
}

fn into_record(row: RawRow) -> Result<TransactionRecord> {
    let line = row.amount_line;
    let missing = |field| Error::MissingField { field, line };

    let settlement_date = row.ctx.settlement_date.ok_or_else(|| missing("settlement_date"))?;
    let card_number = row.ctx.card_number.ok_or_else(|| missing("card_number"))?;
    let owner = row.ctx.owner.ok_or_else(|| missing("owner"))?;
    let amount_raw = row.draft.amount_raw.as_deref().ok_or_else(|| missing("amount"))?;

    Ok(TransactionRecord {
        settlement_date,
        card_number,
        owner: Some(owner),
        transaction_date: parse_short_date(&row.draft.transaction_date_raw, MonthCase::Title)?,
        posting_date: None,
        description: clean_line(&row.draft.joined()),
        amount: parse_grouped_amount(amount_raw, " CR", true)?,
        order: line,
    })
}
