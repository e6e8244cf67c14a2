//! Validation utilities

use crate::types::*;

/// Validate that an account ID is valid
pub fn validate_account_id(account_id: &str) -> ReconcileResult<()> {
    if account_id.trim().is_empty() {
        return Err(ReconcileError::Validation(
            "Account ID cannot be empty".to_string(),
        ));
    }

    if account_id.len() > 50 {
        return Err(ReconcileError::Validation(
            "Account ID cannot exceed 50 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !account_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ReconcileError::Validation(
            "Account ID can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate that a transaction ID referenced by a session is valid
pub fn validate_transaction_id(transaction_id: &str) -> ReconcileResult<()> {
    if transaction_id.trim().is_empty() {
        return Err(ReconcileError::Validation(
            "Transaction ID cannot be empty".to_string(),
        ));
    }

    if transaction_id.len() > 64 {
        return Err(ReconcileError::Validation(
            "Transaction ID cannot exceed 64 characters".to_string(),
        ));
    }

    Ok(())
}
