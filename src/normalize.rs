//! Line cleaning and locale helpers shared by every statement format.
//!
//! Statements are printed with Indonesian month names and two different
//! amount conventions: `1.234.567` (dot grouping, credit cards) and
//! `1,234,567.89` (comma grouping, debit accounts and Jenius).

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Three-letter upper-case month abbreviations used in `DD-MMM` tokens.
/// August is printed as either `AGS` or `AGU`.
const SHORT_MONTHS_UPPER: [(&str, u32); 13] = [
    ("JAN", 1),
    ("FEB", 2),
    ("MAR", 3),
    ("APR", 4),
    ("MEI", 5),
    ("JUN", 6),
    ("JUL", 7),
    ("AGS", 8),
    ("AGU", 8),
    ("SEP", 9),
    ("OKT", 10),
    ("NOV", 11),
    ("DES", 12),
];

/// Capitalized three-letter abbreviations used by the label-driven format.
const SHORT_MONTHS_TITLE: [(&str, u32); 12] = [
    ("Jan", 1),
    ("Feb", 2),
    ("Mar", 3),
    ("Apr", 4),
    ("Mei", 5),
    ("Jun", 6),
    ("Jul", 7),
    ("Agt", 8),
    ("Sep", 9),
    ("Okt", 10),
    ("Nov", 11),
    ("Des", 12),
];

const FULL_MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Which spelling of the month tables a format uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthCase {
    /// `DES`, `DESEMBER`
    Upper,
    /// `Des`, `Desember`
    Title,
}

/// Collapse every run of whitespace (tabs included) into a single space and
/// trim both ends.
pub fn clean_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Look up a three-letter month abbreviation.
pub fn short_month(name: &str, case: MonthCase) -> Result<u32> {
    let found = match case {
        MonthCase::Upper => SHORT_MONTHS_UPPER.iter().find(|(n, _)| *n == name),
        MonthCase::Title => SHORT_MONTHS_TITLE.iter().find(|(n, _)| *n == name),
    };
    found
        .map(|(_, m)| *m)
        .ok_or_else(|| Error::InvalidDate(format!("unknown month abbreviation: {}", name)))
}

/// Look up a full Indonesian month name.
pub fn full_month(name: &str, case: MonthCase) -> Result<u32> {
    FULL_MONTHS
        .iter()
        .position(|m| match case {
            MonthCase::Upper => m.to_uppercase() == name,
            MonthCase::Title => *m == name,
        })
        .map(|i| i as u32 + 1)
        .ok_or_else(|| Error::InvalidDate(format!("unknown month name: {}", name)))
}

/// Parse `<day> <MONTH-NAME> <year>`, e.g. `15 JANUARI 2024`.
pub fn parse_long_date(s: &str, case: MonthCase) -> Result<NaiveDate> {
    let parts: Vec<&str> = s.split(' ').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(Error::InvalidDate(s.to_string()));
    };
    let month = full_month(month, case)?;
    ymd(parse_number(year, s)?, month, parse_number(day, s)?)
}

/// Parse `<day> <Mon> <year>` with an abbreviated month, e.g. `5 Jan 2024`.
pub fn parse_short_date(s: &str, case: MonthCase) -> Result<NaiveDate> {
    let parts: Vec<&str> = s.split(' ').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(Error::InvalidDate(s.to_string()));
    };
    let month = short_month(month, case)?;
    ymd(parse_number(year, s)?, month, parse_number(day, s)?)
}

/// Parse `<MONTH-NAME> <year>` as the first day of that month.
pub fn parse_period(s: &str, case: MonthCase) -> Result<NaiveDate> {
    let (month, year) = s
        .split_once(' ')
        .ok_or_else(|| Error::InvalidDate(s.to_string()))?;
    ymd(parse_number(year, s)?, full_month(month, case)?, 1)
}

/// Resolve a day/month pair against the statement's settlement date.
///
/// A transaction in the settlement month belongs to the settlement year;
/// any other month belongs to the year of the day before the settlement
/// month began. A January statement therefore places December purchases in
/// the previous year.
pub fn resolve_year(settlement: NaiveDate, month: u32, day: u32) -> Result<NaiveDate> {
    let year = if settlement.month() == month {
        settlement.year()
    } else {
        settlement
            .with_day(1)
            .and_then(|first| first.pred_opt())
            .map(|d| d.year())
            .ok_or_else(|| Error::InvalidDate(settlement.to_string()))?
    };
    ymd(year, month, day)
}

/// Parse a `DD-MMM` token (e.g. `01-DES`) with an inferred year.
pub fn parse_day_month(token: &str, settlement: NaiveDate) -> Result<NaiveDate> {
    let (day, month) = token
        .split_once('-')
        .ok_or_else(|| Error::InvalidDate(token.to_string()))?;
    let month = short_month(month, MonthCase::Upper)?;
    resolve_year(settlement, month, parse_number(day, token)?)
}

/// Parse a credit-card amount such as `1.234.567` or `50.000 CR`.
///
/// Charges are negative; a trailing `CR` marks a credit and keeps the value
/// positive.
pub fn parse_dotted_amount(raw: &str) -> Result<Decimal> {
    let raw = raw.trim();
    let (magnitude, credit) = match raw.strip_suffix("CR") {
        Some(rest) => (rest, true),
        None => (raw, false),
    };
    let cleaned = magnitude.trim().replace('.', "").replace(',', ".");
    let value = Decimal::from_str(&cleaned).map_err(|_| Error::InvalidAmount(raw.to_string()))?;
    Ok(if credit { value } else { -value })
}

/// Parse a comma-grouped amount such as `1,000,000.00 DB` or `12.50 CR`.
///
/// The sign comes from `suffix`: when `suffix_is_credit` is set the marked
/// amount is positive and an unmarked one negative (`" CR"`), otherwise the
/// marked amount is negative (`" DB"`).
pub fn parse_grouped_amount(raw: &str, suffix: &str, suffix_is_credit: bool) -> Result<Decimal> {
    let (magnitude, marked) = match raw.strip_suffix(suffix) {
        Some(rest) => (rest, true),
        None => (raw, false),
    };
    let cleaned = magnitude.trim().replace(',', "");
    let value = Decimal::from_str(&cleaned).map_err(|_| Error::InvalidAmount(raw.to_string()))?;
    Ok(if marked == suffix_is_credit { value } else { -value })
}

/// Format a magnitude with thousands grouping and two decimals, e.g.
/// `format_grouped(1234567.5, ',', '.') == "1,234,567.50"`.
pub fn format_grouped(value: Decimal, thousands: char, decimal: char) -> String {
    let mut rounded = value.abs().round_dp(2);
    rounded.rescale(2);
    let text = rounded.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(thousands);
        }
        grouped.push(c);
    }
    format!("{}{}{}", grouped, decimal, frac_part)
}

fn parse_number<T: FromStr>(s: &str, context: &str) -> Result<T> {
    s.parse::<T>()
        .map_err(|_| Error::InvalidDate(context.to_string()))
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::InvalidDate(format!("{}-{}-{}", year, month, day)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_clean_line() {
        assert_eq!(clean_line("  01-DES\t02-DES   Coffee  Shop \t"), "01-DES 02-DES Coffee Shop");
        assert_eq!(clean_line(" \t "), "");
    }

    #[test]
    fn test_clean_line_is_idempotent() {
        for line in ["a  b\tc", "   ", "TANGGAL REKENING : 15 JANUARI 2024", "\tx\t\ty  "] {
            let once = clean_line(line);
            assert_eq!(clean_line(&once), once);
        }
    }

    #[test]
    fn test_resolve_year_rollover() {
        let settlement = date(2024, 1, 15);
        assert_eq!(resolve_year(settlement, 12, 1).unwrap(), date(2023, 12, 1));
        assert_eq!(resolve_year(settlement, 1, 3).unwrap(), date(2024, 1, 3));

        let settlement = date(2024, 6, 20);
        assert_eq!(resolve_year(settlement, 5, 31).unwrap(), date(2024, 5, 31));
    }

    #[test]
    fn test_resolve_year_rejects_impossible_day() {
        assert!(resolve_year(date(2023, 3, 15), 2, 30).is_err());
    }

    #[test]
    fn test_parse_day_month() {
        let settlement = date(2024, 1, 15);
        assert_eq!(parse_day_month("01-DES", settlement).unwrap(), date(2023, 12, 1));
        assert_eq!(parse_day_month("17-AGU", date(2024, 9, 1)).unwrap(), date(2024, 8, 17));
        assert_eq!(parse_day_month("17-AGS", date(2024, 9, 1)).unwrap(), date(2024, 8, 17));
        assert!(parse_day_month("01-XYZ", settlement).is_err());
    }

    #[test]
    fn test_parse_long_date_and_period() {
        assert_eq!(parse_long_date("15 JANUARI 2024", MonthCase::Upper).unwrap(), date(2024, 1, 15));
        assert_eq!(parse_long_date("5 Agustus 2023", MonthCase::Title).unwrap(), date(2023, 8, 5));
        assert_eq!(parse_period("SEPTEMBER 2024", MonthCase::Upper).unwrap(), date(2024, 9, 1));
        assert_eq!(parse_short_date("17 Agt 2023", MonthCase::Title).unwrap(), date(2023, 8, 17));
        assert!(parse_long_date("15 JANUARY 2024", MonthCase::Upper).is_err());
    }

    #[test]
    fn test_parse_dotted_amount() {
        assert_eq!(parse_dotted_amount("50.000").unwrap(), Decimal::from(-50000));
        assert_eq!(parse_dotted_amount("50.000 CR").unwrap(), Decimal::from(50000));
        assert_eq!(parse_dotted_amount("1.250.000CR").unwrap(), Decimal::from(1250000));
        assert!(parse_dotted_amount("CR").is_err());
    }

    #[test]
    fn test_parse_grouped_amount() {
        let debit = parse_grouped_amount("1,000,000.00 DB", " DB", false).unwrap();
        assert_eq!(debit, Decimal::from(-1000000));
        let deposit = parse_grouped_amount("2,500.5", " DB", false).unwrap();
        assert_eq!(deposit, Decimal::from_str("2500.5").unwrap());

        let refund = parse_grouped_amount("12.50 CR", " CR", true).unwrap();
        assert_eq!(refund, Decimal::from_str("12.50").unwrap());
        let charge = parse_grouped_amount("12.50", " CR", true).unwrap();
        assert_eq!(charge, Decimal::from_str("-12.50").unwrap());
    }

    #[test]
    fn test_amount_reformat_reproduces_magnitude() {
        for raw in ["1,000,000.00 DB", "999.99", "12,345.60", "0.05"] {
            let value = parse_grouped_amount(raw, " DB", false).unwrap();
            let magnitude = raw.trim_end_matches(" DB");
            assert_eq!(format_grouped(value, ',', '.'), magnitude);
        }

        let value = parse_dotted_amount("1.234.567 CR").unwrap();
        assert_eq!(format_grouped(value, '.', ','), "1.234.567,00");
    }
}
