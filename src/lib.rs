//! # Reconcile Core
//!
//! The account-reconciliation and resilient-synchronization core of a
//! personal finance ledger.
//!
//! ## Features
//!
//! - **Reconciliation engine**: cleared-balance computation, statement
//!   comparison, and atomic reconciliation marking with synthesized
//!   balancing adjustments
//! - **Resilient execution**: bounded exponential backoff around
//!   unreliable bank-sync calls, with transient/fatal classification and
//!   cooperative cancellation
//! - **Mutation batching**: debounced, key-coalesced state updates so
//!   bulk clearing produces one state transition instead of many
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   ledger and bank-sync seams
//!
//! ## Quick Start
//!
//! ```rust
//! use reconcile_core::{ReconciliationEngine, ReconciliationSession, utils::MemoryLedger};
//! use std::collections::HashSet;
//!
//! // This example shows basic usage - production callers implement the
//! // LedgerStore trait over their own backend.
//! // let engine = ReconciliationEngine::new(MemoryLedger::new());
//! // let result = engine.finalize(session).await?;
//! ```

pub mod api;
pub mod batch;
pub mod reconciliation;
pub mod retry;
pub mod sync;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use api::{ApiError, ReconcileApi, ReconcileRequest, ReconcileResponse};
pub use batch::MutationBatcher;
pub use reconciliation::{
    compute_cleared_balance, statement_minor_units, ClearingSession, ReconciliationEngine,
};
pub use retry::{cancel_pair, CancelHandle, CancelToken, RetryPolicy};
pub use sync::BankSyncService;
pub use traits::*;
pub use types::*;
