//! Core data models for the ledger

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Opaque roster identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    pub fn new(id: impl Into<String>) -> Self {
        StudentId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Stable identifier (absent in older roster generations)
    pub id: Option<StudentId>,
    /// Display name
    pub name: String,
    /// Class or section
    pub class: String,
}

impl Student {
    pub fn new(id: Option<&str>, name: &str, class: &str) -> Self {
        Self {
            id: id.map(StudentId::new),
            name: name.to_string(),
            class: class.to_string(),
        }
    }

    /// Preferred reference for new transactions
    pub fn reference(&self) -> StudentRef {
        match &self.id {
            Some(id) => StudentRef::ById(id.clone()),
            None => self.legacy_reference(),
        }
    }

    /// Composite `(name, class)` reference used by older data
    pub fn legacy_reference(&self) -> StudentRef {
        StudentRef::ByNameClass {
            name: self.name.clone(),
            class: self.class.clone(),
        }
    }

    /// Label shown in lists, e.g. "Asha (7A)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.class)
    }
}

/// Reference from a transaction to the student it belongs to
///
/// Records written before the roster carried ids only know the
/// `(name, class)` pair. Two refs are equal only when they use the same
/// scheme; a roster [`Student`] owns both of its refs and so co-resolves them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentRef {
    ById(StudentId),
    ByNameClass { name: String, class: String },
}

impl StudentRef {
    pub fn by_id(id: impl Into<String>) -> Self {
        StudentRef::ById(StudentId::new(id))
    }

    pub fn by_name_class(name: impl Into<String>, class: impl Into<String>) -> Self {
        StudentRef::ByNameClass {
            name: name.into(),
            class: class.into(),
        }
    }

    pub fn id(&self) -> Option<&StudentId> {
        match self {
            StudentRef::ById(id) => Some(id),
            StudentRef::ByNameClass { .. } => None,
        }
    }
}

impl std::fmt::Display for StudentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StudentRef::ById(id) => write!(f, "#{}", id),
            StudentRef::ByNameClass { name, class } => write!(f, "{} ({})", name, class),
        }
    }
}

/// Anything that can say which transaction refs belong to it
pub trait StudentKeys {
    /// Every ref that resolves to this identity
    fn keys(&self) -> Vec<StudentRef>;

    /// Whether a transaction ref belongs to this identity
    fn owns(&self, reference: &StudentRef) -> bool {
        self.keys().iter().any(|key| key == reference)
    }
}

impl StudentKeys for StudentRef {
    fn keys(&self) -> Vec<StudentRef> {
        vec![self.clone()]
    }

    fn owns(&self, reference: &StudentRef) -> bool {
        self == reference
    }
}

impl StudentKeys for Student {
    fn keys(&self) -> Vec<StudentRef> {
        let mut keys = Vec::with_capacity(2);
        if let Some(id) = &self.id {
            keys.push(StudentRef::ById(id.clone()));
        }
        keys.push(self.legacy_reference());
        keys
    }

    fn owns(&self, reference: &StudentRef) -> bool {
        match reference {
            StudentRef::ById(id) => self.id.as_ref() == Some(id),
            StudentRef::ByNameClass { name, class } => *name == self.name && *class == self.class,
        }
    }
}

/// Largest debit or credit accepted on a single row, in whole units
///
/// Keeps every balance sum far inside `Decimal` range.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000;

/// Whether an amount lies in `0..=MAX_AMOUNT_UNITS`
pub fn amount_in_bounds(amount: Decimal) -> bool {
    (!amount.is_sign_negative() || amount.is_zero()) && amount <= Decimal::from(MAX_AMOUNT_UNITS)
}

/// A single ledger line. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Calendar date, no time component
    pub date: NaiveDate,
    /// Owning student
    pub student: StudentRef,
    /// Amount taken out (non-negative)
    pub debit: Decimal,
    /// Amount put in (non-negative)
    pub credit: Decimal,
}

impl Transaction {
    pub fn new(date: NaiveDate, student: StudentRef, debit: Decimal, credit: Decimal) -> Self {
        Self {
            date,
            student,
            debit,
            credit,
        }
    }

    /// Credit minus debit
    pub fn net(&self) -> Decimal {
        self.credit - self.debit
    }

    /// Date in `YYYY-MM-DD` form
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Sum the net amount of a set of transactions
pub fn net_total<'a, I>(transactions: I) -> Decimal
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions.into_iter().map(Transaction::net).sum()
}

/// Stable ascending sort by calendar date
pub(crate) fn sort_by_date(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|tx| tx.date);
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_transaction_net() {
        let a = StudentRef::by_id("A");
        assert_eq!(tx("2024-01-01", &a, "50", "0").net(), dec("-50"));
        assert_eq!(tx("2024-01-01", &a, "0.10", "0.30").net(), dec("0.20"));
    }

    #[test]
    fn test_net_total_has_no_float_drift() {
        let a = StudentRef::by_id("A");
        let rows: Vec<_> = (0..1000).map(|_| tx("2024-01-01", &a, "0", "0.1")).collect();
        assert_eq!(net_total(&rows), dec("100.0"));
    }

    #[test]
    fn test_amount_bounds() {
        assert!(amount_in_bounds(Decimal::ZERO));
        assert!(amount_in_bounds(dec("-0")));
        assert!(amount_in_bounds(dec("1000000000000")));
        assert!(!amount_in_bounds(dec("1000000000000.01")));
        assert!(!amount_in_bounds(dec("-1")));
    }

    #[test]
    fn test_ref_equality_never_mixes_schemes() {
        let by_id = StudentRef::by_id("S1");
        let legacy = StudentRef::by_name_class("Asha", "7A");
        assert_ne!(by_id, legacy);
        assert!(!by_id.owns(&legacy));
        assert_eq!(legacy, StudentRef::by_name_class("Asha", "7A"));
    }

    #[test]
    fn test_student_owns_both_schemes() {
        let student = Student::new(Some("S1"), "Asha", "7A");
        assert!(student.owns(&StudentRef::by_id("S1")));
        assert!(student.owns(&StudentRef::by_name_class("Asha", "7A")));
        assert!(!student.owns(&StudentRef::by_name_class("Asha", "7B")));
        assert!(!student.owns(&StudentRef::by_id("S2")));
        assert_eq!(student.keys().len(), 2);
    }

    #[test]
    fn test_student_without_id_uses_legacy_reference() {
        let student = Student::new(None, "Ravi", "8C");
        assert_eq!(student.reference(), StudentRef::by_name_class("Ravi", "8C"));
        assert!(!student.owns(&StudentRef::by_id("S1")));
        assert_eq!(student.keys(), vec![StudentRef::by_name_class("Ravi", "8C")]);
    }

    #[test]
    fn test_sort_by_date_is_stable() {
        let a = StudentRef::by_id("A");
        let mut rows = vec![
            tx("2024-01-02", &a, "1", "0"),
            tx("2024-01-01", &a, "2", "0"),
            tx("2024-01-02", &a, "3", "0"),
        ];
        sort_by_date(&mut rows);
        let debits: Vec<_> = rows.iter().map(|t| t.debit).collect();
        assert_eq!(debits, vec![dec("2"), dec("1"), dec("3")]);
    }
}
