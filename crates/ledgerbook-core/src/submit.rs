//! Sending an entry batch to the service and tallying the outcome

use futures::future::join_all;

use crate::entry::EntryBatch;
use crate::error::{CoreError, CoreResult, ServiceError};
use crate::models::Transaction;
use crate::service::LedgerService;

/// A row the service did not store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// Position in the batch
    pub index: usize,
    pub entry: Transaction,
    pub reason: String,
}

/// Outcome of one submission attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    pub attempted: usize,
    pub saved: usize,
    /// Per-row failures; empty when the batch endpoint was used
    pub failures: Vec<RowFailure>,
}

impl SubmitReport {
    pub fn is_complete(&self) -> bool {
        self.saved == self.attempted
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.saved
    }

    /// `Ok` when every row landed, [`CoreError::PartialWrite`] otherwise
    pub fn into_result(self) -> CoreResult<SubmitReport> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(CoreError::PartialWrite {
                saved: self.saved,
                attempted: self.attempted,
            })
        }
    }
}

/// Submit a batch using whichever write shape the service offers
///
/// The batch endpoint is preferred. When it is missing the rows are sent as
/// independent concurrent requests. Only a service with neither shape is an
/// error; row-level failures are reported in the returned tally.
pub async fn submit_batch(service: &dyn LedgerService, batch: &EntryBatch) -> CoreResult<SubmitReport> {
    let entries = batch.entries();
    let capabilities = service.write_capabilities();

    if capabilities.batch {
        match service.submit_batch(entries).await {
            Ok(saved) => {
                let saved = saved.min(entries.len());
                log::info!("Batch endpoint saved {} of {} rows", saved, entries.len());
                return Ok(SubmitReport {
                    attempted: entries.len(),
                    saved,
                    failures: Vec::new(),
                });
            }
            Err(ServiceError::Unsupported(_)) => {
                log::info!("Batch endpoint unavailable, falling back to per-row writes");
            }
            Err(e) => {
                log::warn!("Batch submission failed: {}", e);
                return Ok(SubmitReport {
                    attempted: entries.len(),
                    saved: 0,
                    failures: entries
                        .iter()
                        .enumerate()
                        .map(|(index, entry)| RowFailure {
                            index,
                            entry: entry.clone(),
                            reason: e.to_string(),
                        })
                        .collect(),
                });
            }
        }
    }

    submit_rows(service, entries).await
}

async fn submit_rows(service: &dyn LedgerService, entries: &[Transaction]) -> CoreResult<SubmitReport> {
    let outcomes = join_all(entries.iter().map(|entry| service.submit_transaction(entry))).await;

    if outcomes
        .iter()
        .all(|outcome| matches!(outcome, Err(ServiceError::Unsupported(_))))
    {
        return Err(CoreError::NotSupported {
            operation: "saveTransaction".to_string(),
        });
    }

    let mut report = SubmitReport {
        attempted: entries.len(),
        ..Default::default()
    };
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(()) => report.saved += 1,
            Err(e) => {
                log::warn!("Row {} ({}) was not saved: {}", index, entries[index].student, e);
                report.failures.push(RowFailure {
                    index,
                    entry: entries[index].clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    log::info!("Per-row writes saved {} of {} rows", report.saved, report.attempted);
    Ok(report)
}
