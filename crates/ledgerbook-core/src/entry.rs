//! Batch entry: turn one screen of debit/credit inputs into transactions

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::models::{amount_in_bounds, StudentRef, Transaction};

/// Raw input for one student on the entry screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRow {
    pub student: StudentRef,
    pub debit_input: String,
    pub credit_input: String,
}

impl EntryRow {
    pub fn new(student: StudentRef, debit_input: impl Into<String>, credit_input: impl Into<String>) -> Self {
        Self {
            student,
            debit_input: debit_input.into(),
            credit_input: credit_input.into(),
        }
    }
}

/// Validated transactions for a single date, never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryBatch {
    date: NaiveDate,
    entries: Vec<Transaction>,
}

impl EntryBatch {
    /// Validate the inputs of one entry screen
    ///
    /// Blank or unparsable amounts count as zero and rows with nothing in
    /// either column are skipped. Fails when the date is missing or when no
    /// row is left to save.
    pub fn build(date_input: &str, rows: &[EntryRow]) -> CoreResult<Self> {
        let date = parse_entry_date(date_input)?;

        let entries: Vec<Transaction> = rows
            .iter()
            .filter_map(|row| {
                let debit = parse_amount_input(&row.debit_input);
                let credit = parse_amount_input(&row.credit_input);
                if debit.is_zero() && credit.is_zero() {
                    None
                } else {
                    Some(Transaction::new(date, row.student.clone(), debit, credit))
                }
            })
            .collect();

        if entries.is_empty() {
            return Err(CoreError::validation("nothing to save: every row is zero"));
        }

        log::debug!("Built batch of {} entries for {}", entries.len(), date);
        Ok(Self { date, entries })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Transaction> {
        self.entries
    }
}

fn parse_entry_date(input: &str) -> CoreResult<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CoreError::validation("a date is required"));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| CoreError::validation(format!("date '{}' is not YYYY-MM-DD", input)))
}

/// Parse a typed amount; anything that is not a number within bounds is zero
pub fn parse_amount_input(input: &str) -> Decimal {
    let input = input.trim();
    if input.is_empty() {
        return Decimal::ZERO;
    }
    match Decimal::from_str(input) {
        Ok(amount) if amount.is_zero() => Decimal::ZERO,
        Ok(amount) if amount.is_sign_negative() => {
            log::warn!("Ignoring negative amount input '{}'", input);
            Decimal::ZERO
        }
        Ok(amount) if !amount_in_bounds(amount) => {
            log::warn!("Ignoring out-of-range amount input '{}'", input);
            Decimal::ZERO
        }
        Ok(amount) => amount,
        Err(_) => {
            log::warn!("Ignoring unparsable amount input '{}'", input);
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;

    fn s(id: &str) -> StudentRef {
        StudentRef::by_id(id)
    }

    #[test]
    fn test_build_example() {
        let batch = EntryBatch::build(
            "2024-03-01",
            &[EntryRow::new(s("S1"), "", ""), EntryRow::new(s("S2"), "10", "0")],
        )
        .unwrap();

        assert_eq!(batch.len(), 1);
        let entry = &batch.entries()[0];
        assert_eq!(entry.student, s("S2"));
        assert_eq!(entry.debit, dec("10"));
        assert_eq!(entry.credit, Decimal::ZERO);
        assert_eq!(entry.date, date("2024-03-01"));
    }

    #[test]
    fn test_blank_date_always_fails() {
        let rows = [EntryRow::new(s("S1"), "5", "5")];
        for blank in ["", "   "] {
            let err = EntryBatch::build(blank, &rows).unwrap_err();
            assert!(matches!(err, CoreError::Validation { .. }));
        }
        assert!(EntryBatch::build("", &[]).is_err());
    }

    #[test]
    fn test_malformed_date_fails() {
        let rows = [EntryRow::new(s("S1"), "5", "")];
        assert!(matches!(
            EntryBatch::build("01/03/2024", &rows),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn test_all_zero_rows_fail_as_nothing_to_save() {
        let rows = [
            EntryRow::new(s("S1"), "0", "0.00"),
            EntryRow::new(s("S2"), "abc", ""),
        ];
        let err = EntryBatch::build("2024-03-01", &rows).unwrap_err();
        assert!(err.to_string().contains("nothing to save"));
    }

    #[test]
    fn test_no_zero_rows_in_batch() {
        let rows = [
            EntryRow::new(s("S1"), "0", "0"),
            EntryRow::new(s("S2"), "", "12.50"),
            EntryRow::new(s("S3"), "x", "y"),
            EntryRow::new(s("S4"), "3", "4"),
            EntryRow::new(s("S5"), "-8", ""),
        ];
        let batch = EntryBatch::build("2024-03-01", &rows).unwrap();

        assert!(batch
            .entries()
            .iter()
            .all(|e| !(e.debit.is_zero() && e.credit.is_zero())));
        let students: Vec<_> = batch.entries().iter().map(|e| e.student.clone()).collect();
        assert_eq!(students, vec![s("S2"), s("S4")]);
    }

    #[test]
    fn test_amounts_round_trip_exactly() {
        assert_eq!(parse_amount_input(" 0.1 ").to_string(), "0.1");
        assert_eq!(parse_amount_input("1234.56").to_string(), "1234.56");
        assert_eq!(parse_amount_input("-0"), Decimal::ZERO);
        assert_eq!(parse_amount_input("-3"), Decimal::ZERO);
    }

    #[test]
    fn test_oversized_input_is_zero() {
        assert_eq!(parse_amount_input("50000000000000000000000000000"), Decimal::ZERO);
        assert_eq!(parse_amount_input("1000000000000"), dec("1000000000000"));
    }
}
