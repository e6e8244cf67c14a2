//! Interactive clearing phase of a reconciliation
//!
//! While the user works through a statement they toggle transactions
//! cleared and uncleared, often rapidly and in bulk. The clearing
//! session coalesces those edits through a [`MutationBatcher`] keyed by
//! transaction id, so only the latest decision per transaction survives
//! into the finalized [`ReconciliationSession`].

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::time::Duration;

use crate::batch::MutationBatcher;
use crate::types::ReconciliationSession;

/// Builder for a [`ReconciliationSession`] with debounced cleared-flag
/// edits.
pub struct ClearingSession {
    account_id: String,
    statement_balance: BigDecimal,
    statement_date: Option<NaiveDate>,
    create_adjustment: bool,
    cleared: MutationBatcher<HashSet<String>>,
}

impl ClearingSession {
    /// Start a clearing session for one account and statement.
    pub fn new(
        account_id: impl Into<String>,
        statement_balance: BigDecimal,
        statement_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            statement_balance,
            statement_date,
            create_adjustment: false,
            cleared: MutationBatcher::new(HashSet::new()),
        }
    }

    /// Request a balancing adjustment for any remaining difference.
    pub fn create_adjustment(mut self, create_adjustment: bool) -> Self {
        self.create_adjustment = create_adjustment;
        self
    }

    /// Override the debounce window. Call before queueing edits.
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.cleared = MutationBatcher::with_debounce(HashSet::new(), window);
        self
    }

    /// Toggle a transaction's cleared state.
    ///
    /// Edits are debounced per transaction id: rapid toggles of the same
    /// transaction collapse to the most recent one.
    pub fn set_cleared(&self, transaction_id: &str, cleared: bool) {
        let id = transaction_id.to_string();
        self.cleared.queue_update(transaction_id, move |set| {
            if cleared {
                set.insert(id);
            } else {
                set.remove(&id);
            }
        });
    }

    /// Snapshot the cleared set, applying any pending edits first.
    pub fn cleared_ids(&self) -> HashSet<String> {
        self.cleared.flush_updates();
        self.cleared.with_state(|set| set.clone())
    }

    /// Finish the clearing phase and produce the session to finalize.
    ///
    /// Pending edits are flushed, never lost.
    pub fn into_session(self) -> ReconciliationSession {
        self.cleared.flush_updates();
        let cleared_transaction_ids = self.cleared.with_state(|set| set.clone());

        ReconciliationSession {
            account_id: self.account_id,
            statement_balance: self.statement_balance,
            statement_date: self.statement_date,
            cleared_transaction_ids,
            create_adjustment: self.create_adjustment,
        }
    }
}
