//! Resilient import of bank-synced transactions into the ledger

use crate::retry::{CancelToken, RetryPolicy};
use crate::traits::{BankSyncSource, LedgerStore};
use crate::types::*;

/// Pulls new transactions from a bank-sync source into the ledger,
/// retrying transient aggregator failures per policy.
pub struct BankSyncService<S: LedgerStore, B: BankSyncSource> {
    store: S,
    source: B,
    policy: RetryPolicy,
}

impl<S: LedgerStore, B: BankSyncSource> BankSyncService<S, B> {
    /// Create a service with the default retry policy.
    pub fn new(store: S, source: B) -> Self {
        Self::with_policy(store, source, RetryPolicy::default())
    }

    /// Create a service with a custom retry policy.
    pub fn with_policy(store: S, source: B, policy: RetryPolicy) -> Self {
        Self {
            store,
            source,
            policy,
        }
    }

    /// Fetch new transactions for an account and append them to the
    /// ledger. Returns the number of imported transactions.
    ///
    /// Transient aggregator failures are retried per policy; fatal
    /// failures, exhaustion, and cancellation surface as
    /// [`ReconcileError::Sync`].
    pub async fn import_account(
        &self,
        account_id: &str,
        cancel: &CancelToken,
    ) -> ReconcileResult<usize> {
        let fetched = self
            .policy
            .execute(cancel, || self.source.fetch_new_transactions(account_id))
            .await?;

        let imported = fetched.len();
        for transaction in fetched {
            self.store.append_transaction(transaction).await?;
        }

        if imported > 0 {
            tracing::info!(account = account_id, imported, "bank sync import complete");
        }
        Ok(imported)
    }
}
