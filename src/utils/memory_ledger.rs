//! In-memory ledger store implementation for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::LedgerStore;
use crate::types::*;

/// In-memory [`LedgerStore`] backed by a shared map.
///
/// Clones share the same underlying ledger, mirroring how a real store
/// handle would be passed around.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl MemoryLedger {
    /// Create an empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-populated with the given transactions.
    pub fn seeded(transactions: impl IntoIterator<Item = Transaction>) -> Self {
        let ledger = Self::new();
        {
            let mut map = ledger.transactions.write().unwrap();
            for transaction in transactions {
                map.insert(transaction.id.clone(), transaction);
            }
        }
        ledger
    }

    /// Fetch a single transaction by id.
    pub fn get(&self, transaction_id: &str) -> Option<Transaction> {
        self.transactions
            .read()
            .unwrap()
            .get(transaction_id)
            .cloned()
    }

    /// Total number of transactions across all accounts.
    pub fn count(&self) -> usize {
        self.transactions.read().unwrap().len()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.transactions.write().unwrap().clear();
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn list_transactions(&self, account_id: &str) -> ReconcileResult<Vec<Transaction>> {
        let transactions = self.transactions.read().unwrap();
        let mut filtered: Vec<Transaction> = transactions
            .values()
            .filter(|transaction| transaction.account_id == account_id)
            .cloned()
            .collect();

        // Deterministic listing order for consumers and tests
        filtered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(filtered)
    }

    async fn append_transaction(&self, transaction: Transaction) -> ReconcileResult<Transaction> {
        let mut transactions = self.transactions.write().unwrap();
        if transactions.contains_key(&transaction.id) {
            return Err(ReconcileError::Storage(format!(
                "Transaction '{}' already exists",
                transaction.id
            )));
        }

        transactions.insert(transaction.id.clone(), transaction.clone());
        Ok(transaction)
    }

    async fn mark_reconciled(
        &self,
        account_id: &str,
        transaction_ids: &[String],
    ) -> ReconcileResult<()> {
        let mut transactions = self.transactions.write().unwrap();

        // Validate every id before touching anything
        for transaction_id in transaction_ids {
            match transactions.get(transaction_id) {
                Some(transaction) if transaction.account_id == account_id => {}
                _ => {
                    return Err(ReconcileError::Reconciliation(format!(
                        "Transaction '{}' does not exist in account '{}'",
                        transaction_id, account_id
                    )));
                }
            }
        }

        for transaction_id in transaction_ids {
            if let Some(transaction) = transactions.get_mut(transaction_id) {
                transaction.mark_reconciled();
            }
        }

        Ok(())
    }
}
