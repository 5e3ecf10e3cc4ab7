//! Boundary trait for the remote ledger service

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::models::{Student, Transaction};

/// Service reference type
pub type ServiceRef = Arc<dyn LedgerService>;

/// Write shapes a deployment understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteCapabilities {
    /// One request per row
    pub single: bool,
    /// All rows in one request
    pub batch: bool,
}

impl Default for WriteCapabilities {
    fn default() -> Self {
        Self {
            single: true,
            batch: false,
        }
    }
}

/// Trait for remote ledger services
///
/// Write methods default to [`ServiceError::Unsupported`] so an
/// implementation only provides the shapes it actually has.
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Fetch the roster
    async fn students(&self) -> Result<Vec<Student>, ServiceError>;

    /// Fetch the full transaction log
    async fn transactions(&self) -> Result<Vec<Transaction>, ServiceError>;

    /// Cross-student listing computed by the service for `[from, to]`
    async fn snapshot(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Transaction>, ServiceError>;

    /// Save a single transaction
    async fn submit_transaction(&self, _entry: &Transaction) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported("saveTransaction"))
    }

    /// Save several transactions at once, returning how many were stored
    async fn submit_batch(&self, _entries: &[Transaction]) -> Result<usize, ServiceError> {
        Err(ServiceError::Unsupported("saveTransactionsBatch"))
    }

    /// Which write shapes are available
    fn write_capabilities(&self) -> WriteCapabilities {
        WriteCapabilities::default()
    }
}
