//! Request/response surface consumed by the UI layer
//!
//! The UI (page plumbing, auth, navigation) lives outside this crate and
//! talks to the reconciliation core through these serde types. Field
//! names follow the documented wire contract (`accountId`,
//! `clearedCount`, …).

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::reconciliation::ReconciliationEngine;
use crate::traits::LedgerStore;
use crate::types::*;

/// Payload of a `POST reconcile` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    pub account_id: String,
    /// Statement balance in major currency units
    pub statement_balance: BigDecimal,
    #[serde(default)]
    pub statement_date: Option<NaiveDate>,
    #[serde(default)]
    pub cleared_transaction_ids: HashSet<String>,
    #[serde(default)]
    pub create_adjustment: bool,
}

/// Successful response of a `POST reconcile` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub success: bool,
    pub account_id: String,
    pub adjustment: Option<Transaction>,
    pub cleared_count: usize,
}

/// Failure response with the HTTP status the UI layer should emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl From<ReconcileError> for ApiError {
    fn from(error: ReconcileError) -> Self {
        let status = match &error {
            // Malformed or referentially inconsistent input is the caller's fault
            ReconcileError::Validation(_) | ReconcileError::Reconciliation(_) => 400,
            ReconcileError::Storage(_) | ReconcileError::Sync(_) => 500,
        };

        Self {
            status,
            message: error.to_string(),
        }
    }
}

/// The reconciliation endpoints exposed to the UI layer.
pub struct ReconcileApi<S: LedgerStore> {
    engine: ReconciliationEngine<S>,
}

impl<S: LedgerStore> ReconcileApi<S> {
    /// Wrap an engine.
    pub fn new(engine: ReconciliationEngine<S>) -> Self {
        Self { engine }
    }

    /// Finalize a reconciliation session (`POST reconcile`).
    pub async fn reconcile(&self, request: ReconcileRequest) -> Result<ReconcileResponse, ApiError> {
        let session = ReconciliationSession {
            account_id: request.account_id,
            statement_balance: request.statement_balance,
            statement_date: request.statement_date,
            cleared_transaction_ids: request.cleared_transaction_ids,
            create_adjustment: request.create_adjustment,
        };

        let result = self.engine.finalize(session).await?;

        Ok(ReconcileResponse {
            success: true,
            account_id: result.account_id,
            adjustment: result.adjustment,
            cleared_count: result.cleared_count,
        })
    }

    /// List an account's transactions (`GET transactions`).
    pub async fn transactions(&self, account_id: &str) -> Result<Vec<Transaction>, ApiError> {
        Ok(self.engine.fetch_transactions(account_id).await?)
    }
}
