//! Cancellation primitive for retried operations
//!
//! A watch-channel pair: the handle flips the flag once, every token
//! clone observes it. Cancellation is cooperative, acted on only at the
//! executor's suspension points, never preemptively.

use tokio::sync::watch;

/// Create a linked cancel handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelToken { receiver })
}

/// Caller-side handle that requests cancellation.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        // Receivers may all be gone already; that is fine.
        let _ = self.sender.send(true);
    }
}

/// Clonable token observed by the retry executor.
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that can never be cancelled, for callers without a handle.
    pub fn never() -> Self {
        let (_handle, token) = cancel_pair();
        token
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once cancellation is requested.
    ///
    /// If the handle is dropped without cancelling, this pends forever:
    /// a dropped handle means nobody can cancel anymore.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow() {
                return;
            }
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
