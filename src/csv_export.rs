//! CSV output of parsed records.
//!
//! The header row carries the column names of the target table, in table
//! order, so the file can be loaded with a plain `COPY ... CSV HEADER`.

use crate::error::Result;
use crate::types::{Column, TransactionRecord};
use csv::Writer;
use std::io::Write;

/// Records laid out as the rows of one target table.
#[derive(Debug, Clone, Copy)]
pub struct CsvTable<'a> {
    pub columns: &'a [Column],
    pub records: &'a [TransactionRecord],
}

impl<'a> CsvTable<'a> {
    pub fn new(columns: &'a [Column], records: &'a [TransactionRecord]) -> Self {
        Self { columns, records }
    }

    /// Write the header row and one row per record.
    ///
    /// # Examples
    ///
    /// ```
    /// use bank_scrape::csv_export::CsvTable;
    /// use bank_scrape::Format;
    ///
    /// let mut out = Vec::new();
    /// CsvTable::new(Format::BcaDebit.columns(), &[]).write_to(&mut out)?;
    /// assert_eq!(
    ///     String::from_utf8(out).unwrap(),
    ///     "settlement_date,card_number,transaction_date,description,amount,order\n"
    /// );
    /// # Ok::<(), bank_scrape::Error>(())
    /// ```
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut csv_writer = Writer::from_writer(writer);

        csv_writer.write_record(self.columns.iter().map(|column| column.name))?;
        for record in self.records {
            csv_writer.write_record(self.columns.iter().map(|column| record.column_value(column)))?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Format;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn record() -> TransactionRecord {
        TransactionRecord {
            settlement_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            card_number: "1234-56XX-XXXX-7890".into(),
            owner: Some("JOHN DOE".into()),
            transaction_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            posting_date: Some(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            description: "HOTEL, BALI".into(),
            amount: Decimal::from_str("-1500000.00").unwrap(),
            order: 1,
        }
    }

    fn write(format: Format, records: &[TransactionRecord]) -> String {
        let mut out = Vec::new();
        CsvTable::new(format.columns(), records).write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_write_dual_date_rows() {
        assert_eq!(
            write(Format::BcaCreditDual, &[record()]),
            "settlement_date,card_number,owner,transaction_date,posting_date,description,amount,order\n\
             2024-01-15,1234-56XX-XXXX-7890,JOHN DOE,2023-12-31,2024-01-02,\"HOTEL, BALI\",-1500000.00,1\n"
        );
    }

    #[test]
    fn test_columns_follow_format() {
        let csv = write(Format::BcaCredit, &[record()]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "2024-01-15,1234-56XX-XXXX-7890,JOHN DOE,2023-12-31,\"HOTEL, BALI\",-1500000.00,1");
    }
}
