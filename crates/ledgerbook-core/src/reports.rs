//! Report structures handed to the presentation layer
//!
//! Dates are `YYYY-MM-DD` strings and amounts plain signed numbers; currency
//! symbols and grouping are left to whoever renders them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Student, Transaction};
use crate::range::RangeView;
use crate::submit::SubmitReport;

/// Lifetime balance of one roster entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentBalance {
    pub id: Option<String>,
    pub name: String,
    pub class: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl StudentBalance {
    pub fn new(student: &Student, balance: Decimal) -> Self {
        Self {
            id: student.id.as_ref().map(|id| id.0.clone()),
            name: student.name.clone(),
            class: student.class.clone(),
            balance,
        }
    }
}

/// One ledger line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementRow {
    pub date: String,
    pub student: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub debit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub credit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net: Decimal,
}

impl From<&Transaction> for StatementRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            date: tx.date_string(),
            student: tx.student.to_string(),
            debit: tx.debit,
            credit: tx.credit,
            net: tx.net(),
        }
    }
}

/// Net movement on one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub net: Decimal,
}

/// A student's dashboard: rows in range, range and lifetime totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementReport {
    pub student: StudentBalance,
    pub period: String,
    pub rows: Vec<StatementRow>,
    #[serde(with = "rust_decimal::serde::float")]
    pub range_total: Decimal,
    pub daily: Vec<DailyTotal>,
}

impl StatementReport {
    pub fn new(student: &Student, lifetime: Decimal, period: String, view: &RangeView) -> Self {
        Self {
            student: StudentBalance::new(student, lifetime),
            period,
            rows: view.transactions.iter().map(StatementRow::from).collect(),
            range_total: view.range_total,
            daily: view
                .daily_totals()
                .into_iter()
                .map(|(date, net)| DailyTotal {
                    date: date.format("%Y-%m-%d").to_string(),
                    net,
                })
                .collect(),
        }
    }

    /// Lifetime balance of the student
    pub fn lifetime_total(&self) -> Decimal {
        self.student.balance
    }
}

/// Cross-student listing for a date interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotReport {
    pub from: String,
    pub to: String,
    pub sign: String,
    pub rows: Vec<StatementRow>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_debit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_credit: Decimal,
}

impl SnapshotReport {
    pub fn new(from: &str, to: &str, sign: &str, transactions: &[Transaction]) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            sign: sign.to_string(),
            rows: transactions.iter().map(StatementRow::from).collect(),
            total_debit: transactions.iter().map(|tx| tx.debit).sum(),
            total_credit: transactions.iter().map(|tx| tx.credit).sum(),
        }
    }
}

/// What happened to a submitted batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSummary {
    pub date: String,
    pub attempted: usize,
    pub saved: usize,
    pub failed_rows: Vec<StatementRow>,
}

impl SubmitSummary {
    pub fn new(date: &str, report: &SubmitReport) -> Self {
        Self {
            date: date.to_string(),
            attempted: report.attempted,
            saved: report.saved,
            failed_rows: report
                .failures
                .iter()
                .map(|failure| StatementRow::from(&failure.entry))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;
    use crate::models::StudentRef;
    use crate::range::range_of;

    #[test]
    fn test_statement_report_serializes_plain_numbers() {
        let student = Student::new(Some("A"), "Asha", "7A");
        let view = range_of(
            &sample_ledger(),
            &StudentRef::by_id("A"),
            Some(date("2024-01-01")),
            Some(date("2024-01-31")),
        );
        let report = StatementReport::new(&student, dec("100"), "January".to_string(), &view);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["range_total"], serde_json::json!(70.0));
        assert_eq!(json["student"]["balance"], serde_json::json!(100.0));
        assert_eq!(json["rows"][0]["date"], "2024-01-01");
        assert_eq!(json["rows"][0]["net"], serde_json::json!(-50.0));
        assert_eq!(json["daily"].as_array().unwrap().len(), 2);
        assert_eq!(report.lifetime_total(), dec("100"));
    }

    #[test]
    fn test_snapshot_report_totals() {
        let report = SnapshotReport::new("2024-01-01", "2024-02-01", "all", &sample_ledger());
        assert_eq!(report.total_debit, dec("50"));
        assert_eq!(report.total_credit, dec("150"));
        assert_eq!(report.rows.len(), 3);
    }
}
