//! BCA credit card statement parser.
//!
//! Transaction rows carry a transaction date and a posting date as `DD-MMM`
//! tokens, a description, and a dot-grouped amount that may end in `CR`:
//!
//! ```text
//! TANGGAL REKENING : 15 JANUARI 2024
//! 1234-56XX-XXXX-7890 JOHN DOE
//! 28-DES 29-DES ALFAMART JAKARTA 50.000
//! 02-JAN 03-JAN TOKOPEDIA
//! JAKARTA ID
//! 125.500
//! 05-JAN 05-JAN PEMBAYARAN - MYBCA 1.000.000 CR
//! ```
//!
//! A description that does not fit on one line continues on the following
//! lines until one of them ends in an amount. One file may hold several
//! cards, each introduced by its own card line.

use crate::error::{Error, Result};
use crate::normalize::{clean_line, parse_day_month, parse_dotted_amount, parse_long_date, MonthCase};
use crate::types::{StatementContext, TransactionDraft, TransactionRecord};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Card number and owner used when a block starts with `SALDO SEBELUMNYA`
/// instead of a card line.
pub const EMPTY_CARD_PLACEHOLDER: &str = "XXXX-XXXX-XXXX-XXXX";

fn card_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}XX-XXXX-\d{4})\s+([A-Za-z]+(?:\s+[A-Za-z]+)*)$").expect("card regex")
    })
}

fn settlement_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^TANGGAL REKENING :\s*(\d{2} [A-Z]+ \d{4})$").expect("settlement regex"))
}

fn empty_card_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^SALDO SEBELUMNYA").expect("empty card regex"))
}

fn single_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2}-[A-Z]{3}) (\d{2}-[A-Z]{3}) (.*?) (\d{1,3}(?:\.\d{3})*\s?(?:CR)?)$")
            .expect("single line regex")
    })
}

fn multi_line_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2}-[A-Z]{3}) (\d{2}-[A-Z]{3}) (.*?)$").expect("multi line start regex"))
}

fn multi_line_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)(\d{1,3}(?:\.\d{3})*\s?(?:CR)?)$").expect("multi line end regex"))
}

fn validation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}-[A-Z]{3}").expect("validation regex"))
}

/// The two credit card layouts sharing this grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditLayout {
    /// Only the transaction date is kept; orders run 0-based across a batch.
    SingleDate,
    /// Transaction and posting dates are both kept, a block may open with
    /// `SALDO SEBELUMNYA` instead of a card line, and orders are 1-based
    /// per file.
    DualDate,
}

#[derive(Debug, Clone, PartialEq)]
enum CreditState {
    /// Before the first card line; everything but header lines is noise.
    SeekingHeader,
    AwaitingTransaction,
    AccumulatingMultiline(TransactionDraft),
}

/// A finished draft stamped with the header it was read under.
#[derive(Debug, Clone, PartialEq)]
struct RawRow {
    settlement_date: NaiveDate,
    card_number: String,
    owner: Option<String>,
    draft: TransactionDraft,
}

struct Step {
    next: CreditState,
    emitted: Option<RawRow>,
}

impl Step {
    fn stay(next: CreditState) -> Self {
        Step { next, emitted: None }
    }
}

fn stamp(ctx: &StatementContext, line: &str, draft: TransactionDraft) -> Result<RawRow> {
    let (settlement_date, card_number) = ctx.require_header(line)?;
    Ok(RawRow {
        settlement_date,
        card_number: card_number.to_string(),
        owner: ctx.owner.clone(),
        draft,
    })
}

fn awaiting_transaction(ctx: &StatementContext, line: &str) -> Result<Step> {
    if let Some(caps) = single_line_re().captures(line) {
        let draft = TransactionDraft {
            transaction_date_raw: caps[1].to_string(),
            posting_date_raw: Some(caps[2].to_string()),
            fragments: vec![caps[3].to_string()],
            amount_raw: Some(caps[4].to_string()),
        };
        return Ok(Step {
            next: CreditState::AwaitingTransaction,
            emitted: Some(stamp(ctx, line, draft)?),
        });
    }

    if let Some(caps) = multi_line_start_re().captures(line) {
        ctx.require_header(line)?;
        let mut draft = TransactionDraft::new(&caps[1], &caps[3]);
        draft.posting_date_raw = Some(caps[2].to_string());
        return Ok(Step::stay(CreditState::AccumulatingMultiline(draft)));
    }

    Ok(Step::stay(CreditState::AwaitingTransaction))
}

fn accumulating_multiline(ctx: &StatementContext, mut draft: TransactionDraft, line: &str) -> Result<Step> {
    match multi_line_end_re().captures(line) {
        Some(caps) => {
            draft.push_fragment(&caps[1]);
            draft.amount_raw = Some(caps[2].to_string());
            Ok(Step {
                next: CreditState::AwaitingTransaction,
                emitted: Some(stamp(ctx, line, draft)?),
            })
        }
        None => {
            draft.push_fragment(line);
            Ok(Step::stay(CreditState::AccumulatingMultiline(draft)))
        }
    }
}

/// Line-by-line state machine for one credit card statement file.
#[derive(Debug, Clone)]
pub struct CreditParser {
    layout: CreditLayout,
    ctx: StatementContext,
    state: CreditState,
    rows: Vec<RawRow>,
    expected: usize,
}

impl CreditParser {
    pub fn new(layout: CreditLayout) -> Self {
        Self {
            layout,
            ctx: StatementContext::default(),
            state: CreditState::SeekingHeader,
            rows: Vec::new(),
            expected: 0,
        }
    }

    /// Consume one raw line.
    pub fn feed(&mut self, raw: &str) -> Result<()> {
        let line = clean_line(raw);
        if line.is_empty() {
            return Ok(());
        }

        if validation_re().is_match(&line) {
            self.expected += 1;
        }

        if let Some(caps) = settlement_date_re().captures(&line) {
            self.ctx.settlement_date = Some(parse_long_date(&caps[1], MonthCase::Upper)?);
            return Ok(());
        }

        if let Some(caps) = card_number_re().captures(&line) {
            self.open_card(&caps[1], &caps[2]);
            return Ok(());
        }

        if self.layout == CreditLayout::DualDate && empty_card_re().is_match(&line) {
            self.open_card(EMPTY_CARD_PLACEHOLDER, EMPTY_CARD_PLACEHOLDER);
            return Ok(());
        }

        let state = std::mem::replace(&mut self.state, CreditState::SeekingHeader);
        let step = match state {
            CreditState::SeekingHeader => Step::stay(CreditState::SeekingHeader),
            CreditState::AwaitingTransaction => awaiting_transaction(&self.ctx, &line)?,
            CreditState::AccumulatingMultiline(draft) => accumulating_multiline(&self.ctx, draft, &line)?,
        };

        self.state = step.next;
        if let Some(row) = step.emitted {
            self.rows.push(row);
        }
        Ok(())
    }

    /// Validate the transaction count and type every row.
    ///
    /// Orders are 0-based for [`CreditLayout::SingleDate`] and 1-based for
    /// [`CreditLayout::DualDate`].
    pub fn finish(self) -> Result<Vec<TransactionRecord>> {
        if self.rows.len() != self.expected {
            return Err(Error::ValidationCountMismatch {
                emitted: self.rows.len(),
                expected: self.expected,
            });
        }

        let layout = self.layout;
        let first_order = match layout {
            CreditLayout::SingleDate => 0,
            CreditLayout::DualDate => 1,
        };

        self.rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| into_record(row, layout, first_order + i))
            .collect()
    }

    fn open_card(&mut self, card_number: &str, owner: &str) {
        self.ctx.card_number = Some(card_number.to_string());
        self.ctx.owner = Some(owner.to_string());
        if self.state == CreditState::SeekingHeader {
            self.state = CreditState::AwaitingTransaction;
        }
    }
}

fn into_record(row: RawRow, layout: CreditLayout, order: usize) -> Result<TransactionRecord> {
    let amount_raw = row
        .draft
        .amount_raw
        .as_deref()
        .ok_or_else(|| Error::InvalidAmount(format!("no amount for `{}`", row.draft.joined())))?;
    let posting_date = match (layout, &row.draft.posting_date_raw) {
        (CreditLayout::DualDate, Some(raw)) => Some(parse_day_month(raw, row.settlement_date)?),
        _ => None,
    };

    Ok(TransactionRecord {
        settlement_date: row.settlement_date,
        card_number: row.card_number,
        owner: row.owner,
        transaction_date: parse_day_month(&row.draft.transaction_date_raw, row.settlement_date)?,
        posting_date,
        description: clean_line(&row.draft.joined()),
        amount: parse_dotted_amount(amount_raw)?,
        order,
    })
}

/// Represents a parsed credit card statement file.
#[derive(Debug, Clone, PartialEq)]
pub struct BcaCreditStatement {
    /// The transactions in statement order.
    pub records: Vec<TransactionRecord>,
}

impl BcaCreditStatement {
    /// Parse the extracted lines of one statement file.
    ///
    /// # Examples
    ///
    /// ```
    /// use bank_scrape::bca_credit::{BcaCreditStatement, CreditLayout};
    ///
    /// let lines = [
    ///     "TANGGAL REKENING : 15 JANUARI 2024",
    ///     "1234-56XX-XXXX-7890 JOHN DOE",
    ///     "01-DES 02-DES Coffee Shop 50.000",
    /// ];
    /// let statement = BcaCreditStatement::from_lines(&lines, CreditLayout::SingleDate)?;
    /// assert_eq!(statement.records.len(), 1);
    /// # Ok::<(), bank_scrape::Error>(())
    /// ```
    pub fn from_lines<S: AsRef<str>>(lines: &[S], layout: CreditLayout) -> Result<Self> {
        let mut parser = CreditParser::new(layout);
        for line in lines {
            parser.feed(line.as_ref())?;
        }
        Ok(BcaCreditStatement {
            records: parser.finish()?,
        })
    }
}
