//! The core reconciliation algorithm

use bigdecimal::rounding::RoundingMode;
use bigdecimal::{BigDecimal, ToPrimitive};
use std::collections::HashSet;

use crate::reconciliation::locks::LockArena;
use crate::traits::{DefaultSessionValidator, LedgerStore, SessionValidator};
use crate::types::*;

/// Sum the amounts of the cleared transactions for an account.
///
/// A pure, order-independent fold: only transactions whose id is in
/// `cleared_ids` and whose account matches count, and set semantics mean
/// an id can never be double-counted.
pub fn compute_cleared_balance(
    transactions: &[Transaction],
    account_id: &str,
    cleared_ids: &HashSet<String>,
) -> i64 {
    transactions
        .iter()
        .filter(|transaction| {
            transaction.account_id == account_id && cleared_ids.contains(&transaction.id)
        })
        .map(|transaction| transaction.amount)
        .sum()
}

/// Convert a statement balance in major currency units to minor units.
///
/// Rounding at the cent boundary is half-away-from-zero, avoiding the
/// systematic bias of truncation: `19.995` becomes `2000`.
pub fn statement_minor_units(statement_balance: &BigDecimal) -> ReconcileResult<i64> {
    let scaled =
        (statement_balance * BigDecimal::from(100)).with_scale_round(0, RoundingMode::HalfUp);

    scaled.to_i64().ok_or_else(|| {
        ReconcileError::Validation(format!(
            "Statement balance out of range: {}",
            statement_balance
        ))
    })
}

/// Reconciles an account's ledger against a user-supplied statement.
///
/// `finalize` runs inside a per-account critical section so two
/// concurrent reconciliations of the same account can never interleave;
/// unrelated accounts proceed in parallel.
pub struct ReconciliationEngine<S: LedgerStore> {
    store: S,
    validator: Box<dyn SessionValidator>,
    locks: LockArena,
}

impl<S: LedgerStore> ReconciliationEngine<S> {
    /// Create an engine over the given ledger store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            validator: Box::new(DefaultSessionValidator),
            locks: LockArena::new(),
        }
    }

    /// Create an engine with a custom session validator.
    pub fn with_validator(store: S, validator: Box<dyn SessionValidator>) -> Self {
        Self {
            store,
            validator,
            locks: LockArena::new(),
        }
    }

    /// Access the underlying ledger store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// List the transactions available to a reconciliation session.
    ///
    /// An unknown account yields an empty list, not an error.
    pub async fn fetch_transactions(&self, account_id: &str) -> ReconcileResult<Vec<Transaction>> {
        self.store.list_transactions(account_id).await
    }

    /// Finalize a reconciliation session, consuming it.
    ///
    /// Validates the session, checks every cleared id against the
    /// account's ledger (failing with no partial effects), computes the
    /// cleared balance and its difference from the statement, optionally
    /// synthesizes a balancing adjustment, and atomically marks the
    /// session's transactions reconciled.
    pub async fn finalize(
        &self,
        session: ReconciliationSession,
    ) -> ReconcileResult<ReconciliationResult> {
        self.validator.validate_session(&session)?;
        let statement_minor = statement_minor_units(&session.statement_balance)?;

        let account_lock = self.locks.lock_for(&session.account_id);
        let _serialized = account_lock.lock().await;

        let transactions = self.store.list_transactions(&session.account_id).await?;

        let known_ids: HashSet<&str> = transactions
            .iter()
            .map(|transaction| transaction.id.as_str())
            .collect();
        for transaction_id in &session.cleared_transaction_ids {
            if !known_ids.contains(transaction_id.as_str()) {
                return Err(ReconcileError::Reconciliation(format!(
                    "Transaction '{}' does not exist in account '{}'",
                    transaction_id, session.account_id
                )));
            }
        }

        let cleared_balance = compute_cleared_balance(
            &transactions,
            &session.account_id,
            &session.cleared_transaction_ids,
        );
        let difference = cleared_balance - statement_minor;

        let adjustment = if session.create_adjustment && difference != 0 {
            let date = session
                .statement_date
                .unwrap_or_else(|| chrono::Utc::now().date_naive());
            let adjustment =
                Transaction::adjustment(session.account_id.as_str(), -difference, date);
            tracing::info!(
                account = %session.account_id,
                amount = adjustment.amount,
                "synthesized balancing adjustment"
            );
            Some(self.store.append_transaction(adjustment).await?)
        } else {
            None
        };

        let mut session_ids: Vec<String> = session.cleared_transaction_ids.iter().cloned().collect();
        session_ids.sort();
        self.store
            .mark_reconciled(&session.account_id, &session_ids)
            .await?;

        Ok(ReconciliationResult {
            account_id: session.account_id,
            adjustment,
            cleared_count: session_ids.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_ledger::MemoryLedger;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    fn balance(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn seeded_engine(amounts: &[i64]) -> (ReconciliationEngine<MemoryLedger>, Vec<String>) {
        let transactions: Vec<Transaction> = amounts
            .iter()
            .map(|&amount| Transaction::new("checking", date(), "Payee", amount))
            .collect();
        let ids = transactions.iter().map(|t| t.id.clone()).collect();
        let engine = ReconciliationEngine::new(MemoryLedger::seeded(transactions));
        (engine, ids)
    }

    fn session(
        ids: &[String],
        statement_balance: BigDecimal,
        create_adjustment: bool,
    ) -> ReconciliationSession {
        ReconciliationSession {
            account_id: "checking".to_string(),
            statement_balance,
            statement_date: Some(date()),
            cleared_transaction_ids: ids.iter().cloned().collect(),
            create_adjustment,
        }
    }

    #[test]
    fn cleared_balance_is_order_independent_and_deduped() {
        let a = Transaction::new("checking", date(), "A", -4500);
        let b = Transaction::new("checking", date(), "B", 250000);
        let foreign = Transaction::new("savings", date(), "C", 99999);

        let cleared: HashSet<String> = [a.id.clone(), b.id.clone(), foreign.id.clone()]
            .into_iter()
            .collect();

        let forward = vec![a.clone(), b.clone(), foreign.clone()];
        let backward = vec![foreign, b, a];

        assert_eq!(compute_cleared_balance(&forward, "checking", &cleared), 245500);
        assert_eq!(
            compute_cleared_balance(&backward, "checking", &cleared),
            245500
        );
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(statement_minor_units(&balance("19.995")).unwrap(), 2000);
        assert_eq!(statement_minor_units(&balance("-19.995")).unwrap(), -2000);
        assert_eq!(statement_minor_units(&balance("19.994")).unwrap(), 1999);
        assert_eq!(statement_minor_units(&balance("2125.00")).unwrap(), 212500);
    }

    #[tokio::test]
    async fn statement_difference_books_a_negated_adjustment() {
        // Scenario: cleared -4500, -3000, 250000 against a 2125.00 statement
        let (engine, ids) = seeded_engine(&[-4500, -3000, 250000]);

        let result = engine
            .finalize(session(&ids, balance("2125.00"), true))
            .await
            .unwrap();

        assert_eq!(result.cleared_count, 3);
        let adjustment = result.adjustment.unwrap();
        assert_eq!(adjustment.amount, -30000);
        assert_eq!(adjustment.date, date());
        assert!(adjustment.is_adjustment());

        // All session transactions and the adjustment are locked in
        let transactions = engine.fetch_transactions("checking").await.unwrap();
        assert_eq!(transactions.len(), 4);
        assert!(transactions.iter().all(|t| t.cleared && t.reconciled));
    }

    #[tokio::test]
    async fn zero_difference_never_creates_an_adjustment() {
        let (engine, ids) = seeded_engine(&[-4500, -3000, 250000]);

        let result = engine
            .finalize(session(&ids, balance("2425.00"), true))
            .await
            .unwrap();

        assert_eq!(result.cleared_count, 3);
        assert!(result.adjustment.is_none());
        assert_eq!(engine.store().count(), 3);
    }

    #[tokio::test]
    async fn empty_cleared_set_books_the_full_statement_balance() {
        let (engine, _ids) = seeded_engine(&[-4500]);

        let result = engine
            .finalize(session(&[], balance("125.00"), true))
            .await
            .unwrap();

        // Deliberate business rule: the whole statement lands in one adjustment
        assert_eq!(result.cleared_count, 0);
        assert_eq!(result.adjustment.unwrap().amount, 12500);
    }

    #[tokio::test]
    async fn unknown_id_fails_without_partial_writes() {
        let (engine, ids) = seeded_engine(&[-4500, -3000]);
        let mut with_ghost = ids.clone();
        with_ghost.push("ghost".to_string());

        let result = engine
            .finalize(session(&with_ghost, balance("10.00"), true))
            .await;

        assert!(matches!(result, Err(ReconcileError::Reconciliation(_))));
        let transactions = engine.fetch_transactions("checking").await.unwrap();
        assert_eq!(transactions.len(), 2);
        assert!(transactions.iter().all(|t| !t.reconciled));
    }

    #[tokio::test]
    async fn second_finalize_is_idempotent() {
        let (engine, ids) = seeded_engine(&[-4500, -3000]);

        let first = engine
            .finalize(session(&ids, balance("-75.00"), false))
            .await
            .unwrap();
        let second = engine
            .finalize(session(&ids, balance("-75.00"), false))
            .await
            .unwrap();

        assert_eq!(first.cleared_count, second.cleared_count);
        assert!(second.adjustment.is_none());
        assert_eq!(engine.store().count(), 2);
    }

    #[tokio::test]
    async fn adjustment_defaults_to_today_without_statement_date() {
        let (engine, ids) = seeded_engine(&[-4500]);
        let mut session = session(&ids, balance("10.00"), true);
        session.statement_date = None;

        let result = engine.finalize(session).await.unwrap();

        let adjustment = result.adjustment.unwrap();
        assert_eq!(adjustment.date, chrono::Utc::now().date_naive());
    }

    #[tokio::test]
    async fn malformed_session_fails_validation_with_no_effects() {
        let (engine, ids) = seeded_engine(&[-4500]);
        let mut session = session(&ids, balance("10.00"), true);
        session.account_id = String::new();

        let result = engine.finalize(session).await;

        assert!(matches!(result, Err(ReconcileError::Validation(_))));
        assert_eq!(engine.store().count(), 1);
    }
}
