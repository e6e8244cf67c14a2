//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

/// Category assigned to synthesized balancing adjustments.
pub const ADJUSTMENT_CATEGORY: &str = "Adjustment";

/// A single ledger transaction.
///
/// Transactions are created by user entry or bank sync and are mutable
/// while pending. Once reconciled they are locked in: the only mutation
/// path is the clearing/reconciliation flow, and `reconciled` implies
/// `cleared` by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Opaque stable identifier
    pub id: String,
    /// Account this transaction belongs to
    pub account_id: String,
    /// Date the transaction occurred
    pub date: NaiveDate,
    /// Counterparty shown on the ledger
    pub payee: String,
    /// Signed amount in minor currency units (cents)
    pub amount: i64,
    /// Optional budget category
    pub category: Option<String>,
    /// Whether the user confirmed this transaction appears on a statement
    pub cleared: bool,
    /// Whether a completed reconciliation locked this transaction in
    pub reconciled: bool,
}

impl Transaction {
    /// Create a new pending transaction with a generated id.
    pub fn new(
        account_id: impl Into<String>,
        date: NaiveDate,
        payee: impl Into<String>,
        amount: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.into(),
            date,
            payee: payee.into(),
            amount,
            category: None,
            cleared: false,
            reconciled: false,
        }
    }

    /// Attach a budget category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Synthesize a balancing adjustment transaction.
    ///
    /// Adjustments are born cleared and reconciled, carrying the
    /// [`ADJUSTMENT_CATEGORY`] category.
    pub fn adjustment(account_id: impl Into<String>, amount: i64, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.into(),
            date,
            payee: "Reconciliation Balance Adjustment".to_string(),
            amount,
            category: Some(ADJUSTMENT_CATEGORY.to_string()),
            cleared: true,
            reconciled: true,
        }
    }

    /// Lock the transaction in as matched against a statement.
    ///
    /// Sets both flags so a reconciled transaction is always cleared.
    pub fn mark_reconciled(&mut self) {
        self.cleared = true;
        self.reconciled = true;
    }

    /// Whether this transaction was synthesized to balance a statement.
    pub fn is_adjustment(&self) -> bool {
        self.category.as_deref() == Some(ADJUSTMENT_CATEGORY)
    }
}

/// One reconciliation attempt against a statement.
///
/// Ephemeral: scoped to a single account and statement, consumed exactly
/// once by [`crate::ReconciliationEngine::finalize`], never persisted.
#[derive(Debug, Clone)]
pub struct ReconciliationSession {
    /// Account being reconciled
    pub account_id: String,
    /// Externally reported balance, in major currency units
    pub statement_balance: BigDecimal,
    /// Statement date; the adjustment falls back to today when absent
    pub statement_date: Option<NaiveDate>,
    /// Transactions the user confirmed against the statement
    pub cleared_transaction_ids: HashSet<String>,
    /// Whether to synthesize a balancing adjustment for any difference
    pub create_adjustment: bool,
}

/// Immutable outcome of a finalized reconciliation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    /// Account that was reconciled
    pub account_id: String,
    /// Balancing adjustment, when one was created
    pub adjustment: Option<Transaction>,
    /// Number of session transactions marked reconciled (excludes the adjustment)
    pub cleared_count: usize,
}

/// Failure signal from a bank-sync source.
///
/// The first four variants form the transient-fault vocabulary the retry
/// executor is allowed to retry; everything else is fatal.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection reset: {0}")]
    ConnectionReset(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("sync source error: {0}")]
    Upstream(String),
}

impl SyncError {
    /// Whether this failure is expected to succeed on retry.
    pub fn is_transient(&self) -> bool {
        !matches!(self, SyncError::Upstream(_))
    }
}

/// Outcome of a retried operation that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// Transient failures persisted past the retry budget.
    #[error("sync failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: SyncError,
    },
    /// The failure was outside the transient-fault vocabulary.
    #[error(transparent)]
    Fatal(SyncError),
    /// The caller cancelled while waiting to retry.
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Malformed session input, surfaced immediately and never retried
    #[error("validation error: {0}")]
    Validation(String),
    /// Referential inconsistency between the session and the ledger
    #[error("reconciliation error: {0}")]
    Reconciliation(String),
    /// A ledger-store collaborator failed
    #[error("storage error: {0}")]
    Storage(String),
    /// Bank sync failed after classification by the retry executor
    #[error(transparent)]
    Sync(#[from] RetryError),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Per-invocation bookkeeping for one retried call. Never persisted.
#[derive(Debug, Default)]
pub(crate) struct RetryState {
    /// 0-based count of completed operation runs that failed
    pub attempt: u32,
    /// Most recent transient failure
    pub last_error: Option<SyncError>,
    /// Backoff chosen before the next run
    pub next_delay: Option<Duration>,
}

impl RetryState {
    /// Record a transient failure and the delay picked for the next run.
    pub fn record(&mut self, error: SyncError, next_delay: Duration) {
        self.last_error = Some(error);
        self.next_delay = Some(next_delay);
    }
}
