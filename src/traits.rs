//! Traits for the ledger-store and bank-sync seams

use async_trait::async_trait;

use crate::types::*;
use crate::utils::validation;

/// Durable store of transactions for the ledger.
///
/// This trait allows the reconciliation core to work with any ledger
/// backend (managed database, SQLite, in-memory, etc.). Implementations
/// use interior mutability so one store handle can serve concurrent
/// reconciliation sessions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// List every transaction recorded for an account.
    ///
    /// An unknown account yields an empty list, not an error.
    async fn list_transactions(&self, account_id: &str) -> ReconcileResult<Vec<Transaction>>;

    /// Append a transaction to the ledger and return it as stored.
    async fn append_transaction(&self, transaction: Transaction) -> ReconcileResult<Transaction>;

    /// Mark the given transactions cleared and reconciled, atomically.
    ///
    /// Either every id transitions or none do: implementations must
    /// verify that all ids belong to the account before mutating
    /// anything, failing with [`ReconcileError::Reconciliation`]
    /// otherwise.
    async fn mark_reconciled(
        &self,
        account_id: &str,
        transaction_ids: &[String],
    ) -> ReconcileResult<()>;
}

/// External bank-aggregation pipeline feeding new transactions.
///
/// Calls are opaque and unreliable; the returned [`SyncError`] carries
/// the transient/fatal classification the retry executor acts on.
#[async_trait]
pub trait BankSyncSource: Send + Sync {
    /// Fetch transactions that appeared upstream since the last import.
    async fn fetch_new_transactions(
        &self,
        account_id: &str,
    ) -> Result<Vec<Transaction>, SyncError>;
}

/// Trait for validating a reconciliation session before any effects.
pub trait SessionValidator: Send + Sync {
    /// Validate a session; failure must leave no partial effects.
    fn validate_session(&self, session: &ReconciliationSession) -> ReconcileResult<()>;
}

/// Default session validator with basic rules
pub struct DefaultSessionValidator;

impl SessionValidator for DefaultSessionValidator {
    fn validate_session(&self, session: &ReconciliationSession) -> ReconcileResult<()> {
        validation::validate_account_id(&session.account_id)?;

        for transaction_id in &session.cleared_transaction_ids {
            validation::validate_transaction_id(transaction_id)?;
        }

        Ok(())
    }
}
