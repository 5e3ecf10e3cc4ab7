//! In-memory transaction store
//!
//! The store never patches its contents. Each load builds a new list and
//! swaps it in under the lock, so readers always see a whole snapshot.

use std::sync::{Arc, RwLock};

use crate::error::{CoreError, CoreResult};
use crate::models::Transaction;
use crate::service::LedgerService;

/// An immutable view of the store at one point in time
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Bumped on every replacement; 0 means never loaded
    pub generation: u64,
    /// Transactions in arrival order
    pub transactions: Arc<Vec<Transaction>>,
}

impl StoreSnapshot {
    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }
}

/// Holds the canonical transaction list for a session
#[derive(Debug, Default)]
pub struct TransactionStore {
    current: RwLock<StoreSnapshot>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every transaction and replace the current contents
    ///
    /// On failure the previous snapshot is left in place.
    pub async fn load(&self, service: &dyn LedgerService) -> CoreResult<StoreSnapshot> {
        let transactions = service.transactions().await.map_err(|e| {
            log::warn!("Transaction load failed, keeping previous snapshot: {}", e);
            CoreError::Fetch { message: e.to_string() }
        })?;

        let snapshot = self.replace(transactions);
        log::info!(
            "Loaded {} transactions (generation {})",
            snapshot.transactions.len(),
            snapshot.generation
        );
        Ok(snapshot)
    }

    /// Install a new transaction list wholesale
    pub fn replace(&self, transactions: Vec<Transaction>) -> StoreSnapshot {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let next = StoreSnapshot {
            generation: guard.generation + 1,
            transactions: Arc::new(transactions),
        };
        *guard = next.clone();
        next
    }

    /// All transactions in arrival order
    pub fn all(&self) -> Arc<Vec<Transaction>> {
        self.snapshot().transactions
    }

    /// The current snapshot
    pub fn snapshot(&self) -> StoreSnapshot {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().unwrap_or_else(|e| e.into_inner()).generation
    }
}
