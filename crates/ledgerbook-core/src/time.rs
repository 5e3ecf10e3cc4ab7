//! Named statement periods resolved to inclusive date bounds

use chrono::{Datelike, NaiveDate};

pub use ledgerbook_config::TimeRange;

/// A statement period: a named range or explicit bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Named(TimeRange),
    Custom {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl Default for Period {
    fn default() -> Self {
        Period::Named(TimeRange::All)
    }
}

impl Period {
    /// Explicit bounds win over the named range when either is given
    pub fn from_args(range: TimeRange, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        if from.is_some() || to.is_some() {
            Period::Custom { from, to }
        } else {
            Period::Named(range)
        }
    }

    /// Inclusive `(from, to)` bounds relative to `today`
    pub fn bounds(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match *self {
            Period::Custom { from, to } => (from, to),
            Period::Named(TimeRange::All) => (None, None),
            Period::Named(TimeRange::Month) => (
                NaiveDate::from_ymd_opt(today.year(), today.month(), 1),
                last_day_of_month(today.year(), today.month()),
            ),
            Period::Named(TimeRange::Quarter) => {
                let first_month = (today.month0() / 3) * 3 + 1;
                (
                    NaiveDate::from_ymd_opt(today.year(), first_month, 1),
                    last_day_of_month(today.year(), first_month + 2),
                )
            }
            Period::Named(TimeRange::Year) => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1),
                NaiveDate::from_ymd_opt(today.year(), 12, 31),
            ),
        }
    }

    /// Human-readable description
    pub fn description(&self, today: NaiveDate) -> String {
        match self.bounds(today) {
            (None, None) => "All Time".to_string(),
            (Some(from), Some(to)) => format!("{} to {}", from, to),
            (Some(from), None) => format!("from {}", from),
            (None, Some(to)) => format!("until {}", to),
        }
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
}
