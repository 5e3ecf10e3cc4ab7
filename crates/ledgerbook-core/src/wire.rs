//! JSON shapes exchanged with the spreadsheet service
//!
//! The sheet has been through several layouts. Students may or may not carry
//! an `id`, transaction rows carry either `studentId` or `name`/`class`, dates
//! may come back as full timestamps and amounts as numbers, numeric strings or
//! blanks. Everything is normalised here before it reaches the store.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::ServiceError;
use crate::models::{amount_in_bounds, Student, StudentId, StudentRef, Transaction, MAX_AMOUNT_UNITS};

/// Roster row as sent by `getStudents`
#[derive(Debug, Clone, Deserialize)]
pub struct WireStudent {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub class: Value,
}

/// Transaction row as sent by `getTransactions` / `getSnapshot`
#[derive(Debug, Clone, Deserialize)]
pub struct WireTransaction {
    pub date: Value,
    #[serde(default, rename = "studentId")]
    pub student_id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub class: Option<Value>,
    #[serde(default)]
    pub debit: Value,
    #[serde(default)]
    pub credit: Value,
}

/// Outgoing payload for `saveTransaction` and batch entries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireEntry {
    pub date: String,
    #[serde(rename = "studentId", skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Plain JSON numbers, as the sheet stores them
    pub debit: Value,
    pub credit: Value,
}

/// Response of `saveTransactionsBatch`
#[derive(Debug, Clone, Deserialize)]
pub struct BatchResponse {
    #[serde(rename = "savedCount")]
    pub saved_count: usize,
}

// ==================== Decoding ====================

/// Cell text for ids and classes, which the sheet may store as numbers
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Calendar date from `YYYY-MM-DD` or a timestamp
///
/// A UTC timestamp is moved into the sheet's time zone before the day is
/// taken; one with its own offset keeps its local day. Anything else longer
/// than a date keeps its first ten characters.
pub fn decode_date(value: &Value, sheet_offset: FixedOffset) -> Result<NaiveDate, ServiceError> {
    let text = value
        .as_str()
        .ok_or_else(|| ServiceError::Malformed(format!("date is not a string: {}", value)))?
        .trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        if stamp.offset().local_minus_utc() == 0 {
            return Ok(stamp.with_timezone(&sheet_offset).date_naive());
        }
        return Ok(stamp.date_naive());
    }
    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| ServiceError::Malformed(format!("unrecognised date '{}'", text)))
}

/// Amount from a number, numeric string or blank cell, within `0..=MAX_AMOUNT_UNITS`
pub fn decode_amount(value: &Value, field: &str) -> Result<Decimal, ServiceError> {
    let amount = match value {
        Value::Null => Decimal::ZERO,
        Value::String(s) if s.trim().is_empty() => Decimal::ZERO,
        Value::String(s) => Decimal::from_str(s.trim())
            .map_err(|_| ServiceError::Malformed(format!("{} '{}' is not a number", field, s)))?,
        // Decimal parses the JSON literal so e.g. 0.1 stays exactly 0.1
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(|_| ServiceError::Malformed(format!("{} {} is out of range", field, n)))?,
        other => {
            return Err(ServiceError::Malformed(format!("{} has unexpected value {}", field, other)))
        }
    };
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ServiceError::Malformed(format!("{} {} is negative", field, amount)));
    }
    if !amount_in_bounds(amount) {
        return Err(ServiceError::Malformed(format!(
            "{} {} exceeds {}",
            field, amount, MAX_AMOUNT_UNITS
        )));
    }
    Ok(amount)
}

impl WireStudent {
    pub fn into_student(self) -> Result<Student, ServiceError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Malformed("student without a name".to_string()));
        }
        Ok(Student {
            id: self.id.as_ref().and_then(cell_text).map(StudentId),
            name,
            class: cell_text(&self.class).unwrap_or_default(),
        })
    }
}

impl WireTransaction {
    fn student_ref(&self) -> Result<StudentRef, ServiceError> {
        if let Some(id) = self.student_id.as_ref().and_then(cell_text) {
            return Ok(StudentRef::ById(StudentId(id)));
        }
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(StudentRef::ByNameClass {
                name: name.to_string(),
                class: self.class.as_ref().and_then(cell_text).unwrap_or_default(),
            }),
            _ => Err(ServiceError::Malformed(
                "transaction has neither studentId nor name".to_string(),
            )),
        }
    }

    pub fn into_transaction(self, sheet_offset: FixedOffset) -> Result<Transaction, ServiceError> {
        Ok(Transaction {
            date: decode_date(&self.date, sheet_offset)?,
            student: self.student_ref()?,
            debit: decode_amount(&self.debit, "debit")?,
            credit: decode_amount(&self.credit, "credit")?,
        })
    }
}

/// Decode a roster payload
pub fn decode_students(payload: Value) -> Result<Vec<Student>, ServiceError> {
    let rows: Vec<WireStudent> =
        serde_json::from_value(payload).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    rows.into_iter().map(WireStudent::into_student).collect()
}

/// Decode a transaction or snapshot payload; one bad row rejects the whole payload
pub fn decode_transactions(payload: Value, sheet_offset: FixedOffset) -> Result<Vec<Transaction>, ServiceError> {
    let rows: Vec<WireTransaction> =
        serde_json::from_value(payload).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            row.into_transaction(sheet_offset)
                .map_err(|e| ServiceError::Malformed(format!("row {}: {}", index, e)))
        })
        .collect()
}

// ==================== Encoding ====================

fn amount_value(amount: Decimal) -> Value {
    serde_json::from_str(&amount.to_string()).unwrap_or(Value::Null)
}

impl From<&Transaction> for WireEntry {
    fn from(tx: &Transaction) -> Self {
        let (student_id, name, class) = match &tx.student {
            StudentRef::ById(id) => (Some(id.0.clone()), None, None),
            StudentRef::ByNameClass { name, class } => (None, Some(name.clone()), Some(class.clone())),
        };
        WireEntry {
            date: tx.date_string(),
            student_id,
            name,
            class,
            debit: amount_value(tx.debit),
            credit: amount_value(tx.credit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;
    use serde_json::json;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    #[test]
    fn test_decode_students_with_and_without_id() {
        let students = decode_students(json!([
            {"id": "S1", "name": "Asha", "class": "7A"},
            {"name": "Ravi", "class": 8},
            {"id": "", "name": " Meera ", "class": "7A"}
        ]))
        .unwrap();

        assert_eq!(students[0], Student::new(Some("S1"), "Asha", "7A"));
        assert_eq!(students[1], Student::new(None, "Ravi", "8"));
        assert_eq!(students[2], Student::new(None, "Meera", "7A"));
    }

    #[test]
    fn test_decode_transactions_both_shapes() {
        let rows = decode_transactions(json!([
            {"date": "2024-01-01", "studentId": "S1", "debit": 50, "credit": 0},
            {"date": "2024-01-05T18:30:00.000Z", "name": "Asha", "class": "7A", "debit": "", "credit": "120.25"}
        ]), utc())
        .unwrap();

        assert_eq!(rows[0].student, StudentRef::by_id("S1"));
        assert_eq!(rows[0].debit, dec("50"));
        assert_eq!(rows[1].student, StudentRef::by_name_class("Asha", "7A"));
        assert_eq!(rows[1].date, date("2024-01-05"));
        assert_eq!(rows[1].debit, Decimal::ZERO);
        assert_eq!(rows[1].credit, dec("120.25"));
    }

    #[test]
    fn test_float_amounts_decode_exactly() {
        assert_eq!(decode_amount(&json!(0.1), "credit").unwrap(), dec("0.1"));
        assert_eq!(decode_amount(&json!(19.99), "credit").unwrap(), dec("19.99"));
        assert_eq!(decode_amount(&Value::Null, "credit").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_malformed_rows_are_rejected() {
        assert!(decode_transactions(json!([{"date": "yesterday", "studentId": "S1"}]), utc()).is_err());
        assert!(decode_transactions(json!([{"date": "2024-01-01", "debit": 5}]), utc()).is_err());
        assert!(decode_transactions(json!([{"date": "2024-01-01", "studentId": "S1", "debit": -5}]), utc()).is_err());
        assert!(decode_transactions(json!([{"date": "2024-01-01", "studentId": "S1", "debit": "lots"}]), utc()).is_err());
        assert!(decode_transactions(json!({"error": "quota"}), utc()).is_err());
        assert!(decode_students(json!([{"name": "", "class": "7A"}])).is_err());
    }

    #[test]
    fn test_oversized_amounts_are_rejected() {
        let huge = json!([
            {"date": "2024-01-01", "studentId": "S1", "credit": "50000000000000000000000000000"},
            {"date": "2024-01-02", "studentId": "S1", "credit": "50000000000000000000000000000"}
        ]);
        assert!(matches!(
            decode_transactions(huge, utc()),
            Err(ServiceError::Malformed(_))
        ));
        assert!(decode_amount(&json!(1_000_000_000_001_i64), "debit").is_err());
        assert_eq!(
            decode_amount(&json!("1000000000000"), "debit").unwrap(),
            dec("1000000000000")
        );
    }

    #[test]
    fn test_timestamps_use_sheet_offset() {
        let midnight_ist = json!("2024-01-04T18:30:00.000Z");
        assert_eq!(decode_date(&midnight_ist, ist()).unwrap(), date("2024-01-05"));
        assert_eq!(decode_date(&midnight_ist, utc()).unwrap(), date("2024-01-04"));
        assert_eq!(decode_date(&json!("2024-01-04"), ist()).unwrap(), date("2024-01-04"));
        assert_eq!(
            decode_date(&json!("2024-01-05T00:00:00+05:30"), utc()).unwrap(),
            date("2024-01-05")
        );
        assert_eq!(
            decode_date(&json!("2024-01-05T00:00:00+05:30"), ist()).unwrap(),
            date("2024-01-05")
        );
    }

    #[test]
    fn test_encode_entry() {
        let by_id = tx("2024-03-01", &StudentRef::by_id("S2"), "10", "0");
        let entry = WireEntry::from(&by_id);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"date": "2024-03-01", "studentId": "S2", "debit": 10, "credit": 0})
        );

        let legacy = tx("2024-03-01", &StudentRef::by_name_class("Ravi", "8C"), "0", "2.5");
        assert_eq!(
            serde_json::to_value(WireEntry::from(&legacy)).unwrap(),
            json!({"date": "2024-03-01", "name": "Ravi", "class": "8C", "debit": 0, "credit": 2.5})
        );
    }
}
