//! Single-student statements over an optional date interval

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::models::{net_total, sort_by_date, StudentKeys, Transaction};

/// Transactions for one student within a range, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeView {
    pub transactions: Vec<Transaction>,
    /// Net of `transactions`
    pub range_total: Decimal,
}

impl RangeView {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Net per calendar day, ascending
    pub fn daily_totals(&self) -> BTreeMap<NaiveDate, Decimal> {
        let mut days: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for tx in &self.transactions {
            *days.entry(tx.date).or_default() += tx.net();
        }
        days
    }
}

/// Whether `date` lies in the inclusive interval; a missing bound is open
pub fn in_range(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |from| date >= from) && to.map_or(true, |to| date <= to)
}

/// Collect `who`'s transactions dated within `[from, to]`
///
/// `to` before `from` is not an error; it simply matches nothing.
pub fn range_of<K: StudentKeys + ?Sized>(
    transactions: &[Transaction],
    who: &K,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> RangeView {
    let mut matched: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| who.owns(&tx.student) && in_range(tx.date, from, to))
        .cloned()
        .collect();
    sort_by_date(&mut matched);

    let range_total = net_total(&matched);
    RangeView {
        transactions: matched,
        range_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;
    use crate::models::{Student, StudentRef};

    #[test]
    fn test_range_example() {
        let a = StudentRef::by_id("A");
        let view = range_of(
            &sample_ledger(),
            &a,
            Some(date("2024-01-01")),
            Some(date("2024-01-31")),
        );

        assert_eq!(view.range_total, dec("70"));
        assert_eq!(view.transactions.len(), 2);
        assert_eq!(view.transactions[0].date, date("2024-01-01"));
        assert_eq!(view.transactions[1].date, date("2024-01-05"));
    }

    #[test]
    fn test_inverted_bounds_yield_empty_view() {
        let a = StudentRef::by_id("A");
        let view = range_of(
            &sample_ledger(),
            &a,
            Some(date("2024-02-01")),
            Some(date("2024-01-01")),
        );

        assert!(view.is_empty());
        assert_eq!(view.range_total, Decimal::ZERO);
    }

    #[test]
    fn test_open_bounds() {
        let a = StudentRef::by_id("A");
        let rows = sample_ledger();

        assert_eq!(range_of(&rows, &a, None, None).range_total, dec("100"));
        assert_eq!(range_of(&rows, &a, Some(date("2024-01-05")), None).range_total, dec("150"));
        assert_eq!(range_of(&rows, &a, None, Some(date("2024-01-04"))).range_total, dec("-50"));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let a = StudentRef::by_id("A");
        let view = range_of(
            &sample_ledger(),
            &a,
            Some(date("2024-01-05")),
            Some(date("2024-01-05")),
        );
        assert_eq!(view.transactions.len(), 1);
        assert_eq!(view.range_total, dec("120"));
    }

    #[test]
    fn test_sorted_with_stable_ties_and_other_students_excluded() {
        let a = StudentRef::by_id("A");
        let b = StudentRef::by_id("B");
        let rows = vec![
            tx("2024-03-02", &a, "0", "1"),
            tx("2024-03-01", &b, "0", "500"),
            tx("2024-03-01", &a, "0", "2"),
            tx("2024-03-01", &a, "0", "3"),
        ];
        let view = range_of(&rows, &a, None, None);
        let credits: Vec<_> = view.transactions.iter().map(|t| t.credit).collect();
        assert_eq!(credits, vec![dec("2"), dec("3"), dec("1")]);
    }

    #[test]
    fn test_roster_student_includes_legacy_rows() {
        let student = Student::new(Some("S1"), "Asha", "7A");
        let rows = vec![
            tx("2024-01-02", &StudentRef::by_id("S1"), "0", "10"),
            tx("2024-01-01", &StudentRef::by_name_class("Asha", "7A"), "0", "5"),
        ];
        let view = range_of(&rows, &student, None, None);
        assert_eq!(view.transactions.len(), 2);
        assert_eq!(view.transactions[0].credit, dec("5"));
        assert_eq!(view.range_total, dec("15"));
    }

    #[test]
    fn test_daily_totals() {
        let a = StudentRef::by_id("A");
        let rows = vec![
            tx("2024-01-01", &a, "50", "0"),
            tx("2024-01-01", &a, "0", "20"),
            tx("2024-01-03", &a, "0", "5"),
        ];
        let days = range_of(&rows, &a, None, None).daily_totals();
        let entries: Vec<_> = days.into_iter().collect();
        assert_eq!(
            entries,
            vec![(date("2024-01-01"), dec("-30")), (date("2024-01-03"), dec("5"))]
        );
    }
}
