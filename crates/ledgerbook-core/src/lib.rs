//! Core ledger processing and business logic
//!
//! A [`LedgerBook`] owns one session: the roster, the transaction store and
//! a balance cache tied to the store generation. The filters in [`range`]
//! and [`snapshot`] are plain functions over a store snapshot and can be
//! used without a session.

pub mod balance;
pub mod entry;
pub mod error;
pub mod models;
pub mod range;
pub mod reports;
pub mod service;
pub mod snapshot;
pub mod store;
pub mod submit;
pub mod time;
pub mod wire;

use chrono::NaiveDate;
use ledgerbook_config::Config;
use rust_decimal::Decimal;
use std::sync::{Arc, RwLock};

pub use balance::BalanceAggregator;
pub use entry::{EntryBatch, EntryRow};
pub use error::{CoreError, CoreResult, ErrorSeverity, ServiceError};
pub use models::{Student, StudentId, StudentKeys, StudentRef, Transaction};
pub use range::RangeView;
pub use reports::{SnapshotReport, StatementReport, StudentBalance, SubmitSummary};
pub use service::{LedgerService, ServiceRef, WriteCapabilities};
pub use snapshot::SignFilter;
pub use store::{StoreSnapshot, TransactionStore};
pub use submit::SubmitReport;
pub use time::{Period, TimeRange};

use error::{DefaultErrorLogger, ErrorContext, ErrorLogger};

/// One ledger session against a remote service
pub struct LedgerBook {
    config: Config,
    service: ServiceRef,
    store: TransactionStore,
    roster: RwLock<Arc<Vec<Student>>>,
    aggregator: RwLock<Option<Arc<BalanceAggregator>>>,
    logger: DefaultErrorLogger,
}

impl LedgerBook {
    /// Create a new session with config and service
    pub fn new(config: Config, service: ServiceRef) -> Self {
        Self {
            config,
            service,
            store: TransactionStore::new(),
            roster: RwLock::new(Arc::new(Vec::new())),
            aggregator: RwLock::new(None),
            logger: DefaultErrorLogger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Loading ====================

    /// Fetch the roster, replacing the previous one on success
    pub async fn load_roster(&self) -> CoreResult<Arc<Vec<Student>>> {
        let students = self.service.students().await.map_err(|e| {
            let error = CoreError::Fetch { message: e.to_string() };
            self.logger.log_error(&error, &ErrorContext::new("load_roster"));
            error
        })?;

        let students = Arc::new(students);
        *self.roster.write().unwrap_or_else(|e| e.into_inner()) = students.clone();
        log::info!("Loaded roster of {} students", students.len());
        Ok(students)
    }

    /// Reload the transaction store; balances are recomputed on next use
    pub async fn reload(&self) -> CoreResult<StoreSnapshot> {
        self.store.load(self.service.as_ref()).await.map_err(|error| {
            self.logger.log_error(&error, &ErrorContext::new("reload"));
            error
        })
    }

    /// Load roster and transactions
    pub async fn load(&self) -> CoreResult<()> {
        self.load_roster().await?;
        self.reload().await?;
        Ok(())
    }

    fn ensure_loaded(&self) -> CoreResult<StoreSnapshot> {
        let snapshot = self.store.snapshot();
        if snapshot.is_loaded() {
            Ok(snapshot)
        } else {
            Err(CoreError::NotLoaded)
        }
    }

    // ==================== Roster ====================

    pub fn roster(&self) -> Arc<Vec<Student>> {
        self.roster.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Look up a roster entry by id or by `name|class`
    pub fn find_student(&self, query: &str) -> CoreResult<Student> {
        let query = query.trim();
        let roster = self.roster();

        let found = match query.split_once('|') {
            Some((name, class)) => roster
                .iter()
                .find(|s| s.name == name.trim() && s.class == class.trim()),
            None => roster
                .iter()
                .find(|s| s.id.as_ref().map(|id| id.as_str()) == Some(query)),
        };

        found.cloned().ok_or_else(|| CoreError::StudentNotFound {
            query: query.to_string(),
        })
    }

    // ==================== Balances ====================

    /// All transactions in arrival order
    pub fn transactions(&self) -> Arc<Vec<Transaction>> {
        self.store.all()
    }

    /// Balance aggregator for the current store generation
    pub fn aggregator(&self) -> Arc<BalanceAggregator> {
        self.aggregator_for(&self.store.snapshot())
    }

    /// Aggregator for a given snapshot; only a newer generation replaces the cache
    fn aggregator_for(&self, snapshot: &StoreSnapshot) -> Arc<BalanceAggregator> {
        if let Some(cached) = self.aggregator.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            if cached.generation() == snapshot.generation {
                return cached.clone();
            }
        }

        let fresh = Arc::new(BalanceAggregator::from_snapshot(snapshot));
        let mut slot = self.aggregator.write().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().map_or(true, |cached| cached.generation() < fresh.generation()) {
            *slot = Some(fresh.clone());
        }
        fresh
    }

    /// Lifetime balance for a ref or roster student
    pub fn balance_of<K: StudentKeys + ?Sized>(&self, who: &K) -> Decimal {
        self.aggregator().balance_of(who)
    }

    /// Lifetime balance of every roster entry
    pub fn roster_balances(&self) -> CoreResult<Vec<StudentBalance>> {
        let snapshot = self.ensure_loaded()?;
        let aggregator = self.aggregator_for(&snapshot);
        let roster = self.roster();

        let unmatched = aggregator.unmatched(&roster);
        if !unmatched.is_empty() {
            self.logger.log_warning(
                &format!("{} transaction owners are not on the roster", unmatched.len()),
                &ErrorContext::new("roster_balances").with_data(
                    "owners",
                    serde_json::json!(unmatched.iter().map(|r| r.to_string()).collect::<Vec<_>>()),
                ),
            );
        }

        Ok(aggregator.roster_balances(&roster))
    }

    // ==================== Filters ====================

    /// A student's transactions within optional inclusive bounds
    pub fn range_of<K: StudentKeys + ?Sized>(
        &self,
        who: &K,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> RangeView {
        range::range_of(&self.store.all(), who, from, to)
    }

    /// Dashboard for one student over a period
    pub fn statement(&self, student: &Student, period: Period, today: NaiveDate) -> CoreResult<StatementReport> {
        let snapshot = self.ensure_loaded()?;
        Ok(self.statement_at(&snapshot, student, period, today))
    }

    /// Range and lifetime totals both taken from `snapshot`
    fn statement_at(
        &self,
        snapshot: &StoreSnapshot,
        student: &Student,
        period: Period,
        today: NaiveDate,
    ) -> StatementReport {
        let (from, to) = period.bounds(today);
        let view = range::range_of(&snapshot.transactions, student, from, to);
        let lifetime = self.aggregator_for(snapshot).balance_of(student);
        StatementReport::new(student, lifetime, period.description(today), &view)
    }

    /// Cross-student listing from the local store
    pub fn snapshot_of(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        sign: SignFilter,
    ) -> CoreResult<Vec<Transaction>> {
        snapshot::snapshot_of(&self.store.all(), from, to, sign)
    }

    /// Cross-student listing computed by the service, sign-filtered locally
    pub async fn remote_snapshot(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        sign: SignFilter,
    ) -> CoreResult<Vec<Transaction>> {
        let (from, to) = snapshot::snapshot_bounds(from, to)?;
        let rows = self.service.snapshot(from, to).await.map_err(|e| {
            let error = CoreError::Fetch { message: e.to_string() };
            self.logger.log_error(&error, &ErrorContext::new("remote_snapshot"));
            error
        })?;
        Ok(snapshot::filter_by_sign(rows, sign))
    }

    // ==================== Writes ====================

    /// Submit a batch, then reload the store whatever the outcome
    ///
    /// Returns the raw tally including per-row failures. A failed reload
    /// after the writes is logged but does not change the result.
    pub async fn submit_report(&self, batch: &EntryBatch) -> CoreResult<SubmitReport> {
        let context = ErrorContext::new("submit")
            .with_data("date", serde_json::json!(batch.date().to_string()))
            .with_data("rows", serde_json::json!(batch.len()));

        let report = submit::submit_batch(self.service.as_ref(), batch)
            .await
            .map_err(|error| {
                self.logger.log_error(&error, &context);
                error
            })?;

        if let Err(error) = self.reload().await {
            self.logger.log_warning(
                &format!("store not refreshed after submission: {}", error),
                &context,
            );
        }

        if !report.is_complete() {
            self.logger.log_error(
                &CoreError::PartialWrite {
                    saved: report.saved,
                    attempted: report.attempted,
                },
                &context,
            );
        }
        Ok(report)
    }

    /// Like [`LedgerBook::submit_report`], failing with
    /// [`CoreError::PartialWrite`] unless every row was saved
    pub async fn submit(&self, batch: &EntryBatch) -> CoreResult<SubmitReport> {
        self.submit_report(batch).await?.into_result()
    }
}

// ==================== Tests ====================
