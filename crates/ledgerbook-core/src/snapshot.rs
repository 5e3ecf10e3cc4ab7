//! Cross-student listings for a date interval

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::models::{sort_by_date, Transaction};
use crate::range::in_range;

pub use ledgerbook_config::SignFilter;

/// Whether a transaction passes the sign filter
///
/// Zero-net rows only pass [`SignFilter::All`].
pub fn sign_matches(sign: SignFilter, tx: &Transaction) -> bool {
    let net = tx.net();
    match sign {
        SignFilter::Credit => net > Decimal::ZERO,
        SignFilter::Debit => net < Decimal::ZERO,
        SignFilter::All => true,
    }
}

/// Apply a sign filter and sort ascending by date (stable)
pub fn filter_by_sign(mut transactions: Vec<Transaction>, sign: SignFilter) -> Vec<Transaction> {
    transactions.retain(|tx| sign_matches(sign, tx));
    sort_by_date(&mut transactions);
    transactions
}

/// Resolve snapshot bounds; a missing `to` means a single-day snapshot
pub fn snapshot_bounds(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> CoreResult<(NaiveDate, NaiveDate)> {
    let from = from.ok_or_else(|| CoreError::validation("a snapshot needs a start date"))?;
    Ok((from, to.unwrap_or(from)))
}

/// Every student's transactions within `[from, to]` that pass `sign`
pub fn snapshot_of(
    transactions: &[Transaction],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    sign: SignFilter,
) -> CoreResult<Vec<Transaction>> {
    let (from, to) = snapshot_bounds(from, to)?;
    let matched = transactions
        .iter()
        .filter(|tx| in_range(tx.date, Some(from), Some(to)))
        .cloned()
        .collect();
    Ok(filter_by_sign(matched, sign))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;
    use crate::models::StudentRef;

    fn mixed_ledger() -> Vec<Transaction> {
        let a = StudentRef::by_id("A");
        let b = StudentRef::by_name_class("Ravi", "8C");
        vec![
            tx("2024-01-03", &a, "10", "10"),
            tx("2024-01-02", &b, "0", "25"),
            tx("2024-01-01", &a, "50", "0"),
            tx("2024-01-02", &a, "5", "0"),
            tx("2024-01-09", &b, "0", "1"),
        ]
    }

    #[test]
    fn test_debit_snapshot_example() {
        let rows = snapshot_of(
            &sample_ledger(),
            Some(date("2024-01-01")),
            Some(date("2024-01-05")),
            SignFilter::Debit,
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].net(), dec("-50"));
    }

    #[test]
    fn test_missing_from_is_validation_error() {
        let err = snapshot_of(&sample_ledger(), None, Some(date("2024-01-05")), SignFilter::All)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn test_single_day_default() {
        let rows = mixed_ledger();
        let day = Some(date("2024-01-02"));
        for sign in [SignFilter::All, SignFilter::Credit, SignFilter::Debit] {
            assert_eq!(
                snapshot_of(&rows, day, None, sign).unwrap(),
                snapshot_of(&rows, day, day, sign).unwrap()
            );
        }
        assert_eq!(snapshot_of(&rows, day, None, SignFilter::All).unwrap().len(), 2);
    }

    #[test]
    fn test_sign_filters_partition_all() {
        let rows = mixed_ledger();
        let from = Some(date("2024-01-01"));
        let to = Some(date("2024-01-31"));

        let all = snapshot_of(&rows, from, to, SignFilter::All).unwrap();
        let credit = snapshot_of(&rows, from, to, SignFilter::Credit).unwrap();
        let debit = snapshot_of(&rows, from, to, SignFilter::Debit).unwrap();
        let zero: Vec<_> = all.iter().filter(|tx| tx.net().is_zero()).collect();

        assert_eq!(credit.len() + debit.len() + zero.len(), all.len());
        assert!(credit.iter().all(|tx| !debit.contains(tx)));
        assert!(zero.iter().all(|tx| !credit.contains(tx) && !debit.contains(tx)));
        assert_eq!(zero.len(), 1);
    }

    #[test]
    fn test_sorted_ascending_stable_across_students() {
        let rows = snapshot_of(
            &mixed_ledger(),
            Some(date("2024-01-01")),
            Some(date("2024-01-31")),
            SignFilter::All,
        )
        .unwrap();
        let dates: Vec<_> = rows.iter().map(Transaction::date_string).collect();
        assert_eq!(
            dates,
            vec!["2024-01-01", "2024-01-02", "2024-01-02", "2024-01-03", "2024-01-09"]
        );
        assert_eq!(rows[1].credit, dec("25"));
        assert_eq!(rows[2].debit, dec("5"));
    }
}
