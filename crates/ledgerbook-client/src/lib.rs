//! HTTP client for the spreadsheet web app
//!
//! Reads are `GET {endpoint}?action=...`, writes are `POST {endpoint}` with a
//! JSON body `{"action": ..., "payload": ...}`. Payloads are decoded by
//! [`ledgerbook_core::wire`].

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use ledgerbook_config::ServiceConfig;
use ledgerbook_core::error::ServiceError;
use ledgerbook_core::service::{LedgerService, WriteCapabilities};
use ledgerbook_core::wire::{self, BatchResponse, WireEntry};
use ledgerbook_core::{Student, Transaction};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const ACTION_STUDENTS: &str = "getStudents";
const ACTION_TRANSACTIONS: &str = "getTransactions";
const ACTION_SNAPSHOT: &str = "getSnapshot";
const ACTION_SAVE: &str = "saveTransaction";
const ACTION_SAVE_BATCH: &str = "saveTransactionsBatch";

/// Body of every write request
#[derive(Debug, Serialize)]
struct ActionRequest<'a, P: Serialize> {
    action: &'a str,
    payload: P,
}

#[derive(Debug, Serialize)]
struct BatchPayload<'a> {
    entries: &'a [WireEntry],
}

/// Client for the ledger web app
#[derive(Clone)]
pub struct SheetClient {
    client: Client,
    endpoint: String,
    capabilities: WriteCapabilities,
    sheet_offset: FixedOffset,
}

impl SheetClient {
    /// Create a new client from service settings
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Http(format!("failed to create HTTP client: {}", e)))?;

        let sheet_offset = FixedOffset::east_opt(config.sheet_utc_offset_minutes * 60).unwrap_or_else(|| {
            log::warn!(
                "Ignoring out-of-range sheet offset {} minutes, using UTC",
                config.sheet_utc_offset_minutes
            );
            Utc.fix()
        });

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('?').to_string(),
            capabilities: WriteCapabilities {
                single: config.single_writes,
                batch: config.batch_writes,
            },
            sheet_offset,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn query_pairs(action: &str, extra: &[(&str, String)]) -> Vec<(String, String)> {
        let mut pairs = vec![("action".to_string(), action.to_string())];
        pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.clone())));
        pairs
    }

    async fn get(&self, action: &'static str, extra: &[(&str, String)]) -> Result<Value, ServiceError> {
        log::debug!("GET {} action={}", self.endpoint, action);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&Self::query_pairs(action, extra))
            .send()
            .await
            .map_err(|e| ServiceError::Http(e.to_string()))?;

        Self::read_json(action, response).await
    }

    async fn post<P: Serialize + Send>(&self, action: &'static str, payload: P) -> Result<Value, ServiceError> {
        log::debug!("POST {} action={}", self.endpoint, action);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ActionRequest { action, payload })
            .send()
            .await
            .map_err(|e| ServiceError::Http(e.to_string()))?;

        Self::read_json(action, response).await
    }

    async fn read_json(action: &'static str, response: Response) -> Result<Value, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            log::warn!("{} answered with status {}", action, status);
            return Err(ServiceError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(format!("{}: {}", action, e)))?;
        check_service_error(action, body)
    }
}

/// The web app reports failures as `{"error": "..."}` with status 200
fn check_service_error(action: &'static str, body: Value) -> Result<Value, ServiceError> {
    let message = match body.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => return Ok(body),
        Some(other) => other.to_string(),
    };

    let lowered = message.to_lowercase();
    if lowered.contains("unknown action") || lowered.contains("unsupported") {
        Err(ServiceError::Unsupported(action))
    } else {
        Err(ServiceError::Malformed(format!("{}: {}", action, message)))
    }
}

#[async_trait]
impl LedgerService for SheetClient {
    async fn students(&self) -> Result<Vec<Student>, ServiceError> {
        let payload = self.get(ACTION_STUDENTS, &[]).await?;
        wire::decode_students(payload)
    }

    async fn transactions(&self) -> Result<Vec<Transaction>, ServiceError> {
        let payload = self.get(ACTION_TRANSACTIONS, &[]).await?;
        wire::decode_transactions(payload, self.sheet_offset)
    }

    async fn snapshot(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Transaction>, ServiceError> {
        let payload = self
            .get(
                ACTION_SNAPSHOT,
                &[("from", from.to_string()), ("to", to.to_string())],
            )
            .await?;
        wire::decode_transactions(payload, self.sheet_offset)
    }

    async fn submit_transaction(&self, entry: &Transaction) -> Result<(), ServiceError> {
        if !self.capabilities.single {
            return Err(ServiceError::Unsupported(ACTION_SAVE));
        }
        self.post(ACTION_SAVE, WireEntry::from(entry)).await?;
        Ok(())
    }

    async fn submit_batch(&self, entries: &[Transaction]) -> Result<usize, ServiceError> {
        if !self.capabilities.batch {
            return Err(ServiceError::Unsupported(ACTION_SAVE_BATCH));
        }
        let entries: Vec<WireEntry> = entries.iter().map(WireEntry::from).collect();
        let body = self
            .post(ACTION_SAVE_BATCH, BatchPayload { entries: &entries })
            .await?;

        let response: BatchResponse = serde_json::from_value(body)
            .map_err(|e| ServiceError::Malformed(format!("{}: {}", ACTION_SAVE_BATCH, e)))?;
        Ok(response.saved_count)
    }

    fn write_capabilities(&self) -> WriteCapabilities {
        self.capabilities
    }
}
