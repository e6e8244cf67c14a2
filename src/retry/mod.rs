//! Resilient execution of operations that cross the network boundary
//!
//! Wraps an arbitrary asynchronous operation, classifies failures as
//! recoverable or fatal via [`SyncError::is_transient`], and retries
//! recoverable ones with bounded exponential backoff. The backoff sleep
//! is the only cancellable suspension point: an in-flight operation is
//! never interrupted.

mod cancel;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};

use std::future::Future;
use std::time::Duration;
use tokio::time;

use crate::types::*;

/// Default cap on retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Observer invoked when the retry budget is exhausted.
pub type ExhaustedHook = Box<dyn Fn(&SyncError) + Send + Sync>;

/// Policy governing retried execution of a fallible async operation.
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Double the delay on each retry when set; fixed delay otherwise
    pub exponential: bool,
    /// Called once with the last error when retries run out
    pub on_exhausted: Option<ExhaustedHook>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            exponential: true,
            on_exhausted: None,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the retry cap.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the base delay.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Use a fixed delay between retries instead of doubling.
    pub fn fixed_delay(mut self) -> Self {
        self.exponential = false;
        self
    }

    /// Install an exhaustion observer.
    pub fn with_on_exhausted(mut self, hook: impl Fn(&SyncError) + Send + Sync + 'static) -> Self {
        self.on_exhausted = Some(Box::new(hook));
        self
    }

    /// Backoff before the retry following failed attempt `attempt`.
    fn delay_for(&self, attempt: u32) -> Duration {
        if self.exponential {
            self.base_delay
                .saturating_mul(2u32.saturating_pow(attempt.min(31)))
        } else {
            self.base_delay
        }
    }

    /// Run `operation`, retrying transient failures under this policy.
    ///
    /// Fatal failures propagate immediately with no delay. Cancellation
    /// is observed before each attempt and while waiting to retry,
    /// yielding [`RetryError::Cancelled`].
    pub async fn execute<T, F, Fut>(
        &self,
        cancel: &CancelToken,
        mut operation: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let mut state = RetryState::default();

        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled);
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_transient() => {
                    return Err(RetryError::Fatal(error));
                }
                Err(error) => {
                    let next_delay = self.delay_for(state.attempt);
                    state.record(error, next_delay);
                }
            }

            if state.attempt >= self.max_retries {
                return Err(self.give_up(state));
            }

            let delay = state.next_delay.unwrap_or(self.base_delay);
            tracing::warn!(
                attempt = state.attempt,
                delay_ms = delay.as_millis() as u64,
                "transient sync failure, backing off"
            );

            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            }

            state.attempt += 1;
        }
    }

    fn give_up(&self, state: RetryState) -> RetryError {
        let attempts = state.attempt + 1;
        let source = state
            .last_error
            .unwrap_or_else(|| SyncError::Upstream("retry state lost".to_string()));

        if let Some(hook) = &self.on_exhausted {
            hook(&source);
        }

        tracing::warn!(attempts, error = %source, "sync retries exhausted");
        RetryError::Exhausted { attempts, source }
    }
}
