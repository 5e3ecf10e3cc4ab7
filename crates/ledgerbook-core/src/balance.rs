//! Per-student balances derived from a store snapshot

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::{Student, StudentKeys, StudentRef, Transaction};
use crate::reports::StudentBalance;
use crate::store::StoreSnapshot;

/// Net totals per transaction ref, computed once per snapshot
#[derive(Debug, Clone, Default)]
pub struct BalanceAggregator {
    generation: u64,
    totals: HashMap<StudentRef, Decimal>,
}

impl BalanceAggregator {
    /// Build from a store snapshot in a single pass
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        let mut aggregator = Self::from_transactions(&snapshot.transactions);
        aggregator.generation = snapshot.generation;
        aggregator
    }

    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut totals: HashMap<StudentRef, Decimal> = HashMap::new();
        for tx in transactions {
            *totals.entry(tx.student.clone()).or_default() += tx.net();
        }
        log::debug!(
            "Aggregated {} transactions into {} balances",
            transactions.len(),
            totals.len()
        );
        Self {
            generation: 0,
            totals,
        }
    }

    /// Store generation this aggregator was built from
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Lifetime balance for a ref or a roster student
    pub fn balance_of<K: StudentKeys + ?Sized>(&self, who: &K) -> Decimal {
        who.keys()
            .iter()
            .filter_map(|key| self.totals.get(key))
            .copied()
            .sum()
    }

    /// Lifetime balance for every roster entry, in roster order
    pub fn roster_balances(&self, roster: &[Student]) -> Vec<StudentBalance> {
        roster
            .iter()
            .map(|student| StudentBalance::new(student, self.balance_of(student)))
            .collect()
    }

    /// Refs with transactions that no roster entry owns
    pub fn unmatched(&self, roster: &[Student]) -> Vec<StudentRef> {
        let mut refs: Vec<StudentRef> = self
            .totals
            .keys()
            .filter(|key| !roster.iter().any(|student| student.owns(key)))
            .cloned()
            .collect();
        refs.sort_by_key(|r| r.to_string());
        refs
    }

    /// Sum over every ref
    pub fn grand_total(&self) -> Decimal {
        self.totals.values().copied().sum()
    }
}
