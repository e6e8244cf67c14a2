//! Scripted bank-sync source for exercising the retry path in tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::traits::BankSyncSource;
use crate::types::*;

/// A [`BankSyncSource`] that replays a canned sequence of responses.
///
/// Each fetch pops the next scripted response; once the script runs out,
/// further fetches return an empty batch. Useful for driving the retry
/// executor through transient-then-success and fatal scenarios.
#[derive(Clone, Default)]
pub struct ScriptedSyncSource {
    responses: Arc<Mutex<VecDeque<Result<Vec<Transaction>, SyncError>>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedSyncSource {
    /// Create a source that replays `responses` in order.
    pub fn new(responses: impl IntoIterator<Item = Result<Vec<Transaction>, SyncError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl BankSyncSource for ScriptedSyncSource {
    async fn fetch_new_transactions(
        &self,
        _account_id: &str,
    ) -> Result<Vec<Transaction>, SyncError> {
        *self.calls.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_responses_in_order_then_empties() {
        let source = ScriptedSyncSource::new([
            Err(SyncError::Timeout("slow aggregator".into())),
            Ok(Vec::new()),
        ]);

        assert!(source.fetch_new_transactions("checking").await.is_err());
        assert!(source.fetch_new_transactions("checking").await.is_ok());
        // Script exhausted: further calls yield empty batches
        let batch = source.fetch_new_transactions("checking").await.unwrap();
        assert!(batch.is_empty());
        assert_eq!(source.calls(), 3);
    }
}
