//! Reconciliation of ledger accounts against bank statements

pub mod engine;
pub mod session;

mod locks;

pub use engine::{compute_cleared_balance, statement_minor_units, ReconciliationEngine};
pub use session::ClearingSession;
