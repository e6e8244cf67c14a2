//! Debounced coalescing of state mutations
//!
//! Coalesces logically-independent mutations arriving within a short
//! window into one applied update, keyed by mutation identity, so bulk
//! edits produce a single state transition instead of one write per
//! keystroke. Queued updaters are replayed in FIFO order of each key's
//! most recent enqueue.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

/// Default debounce window before a batch is applied.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

type Updater<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Coalesces keyed state mutations behind a debounce timer.
///
/// `queue_update` supersedes any pending updater under the same key
/// (last-writer-wins) and re-arms the timer; timer expiry or an explicit
/// [`flush_updates`](Self::flush_updates) applies the whole queue as one
/// state transition.
pub struct MutationBatcher<S> {
    inner: Arc<Mutex<BatchInner<S>>>,
    debounce: Duration,
}

struct BatchInner<S> {
    state: S,
    /// key -> (enqueue sequence, updater); replay is ordered by sequence,
    /// so superseding a key moves it to the back of the batch
    queue: HashMap<String, (u64, Updater<S>)>,
    next_seq: u64,
    /// Bumped on every enqueue; a timer only fires for its own epoch
    epoch: u64,
    timer: Option<JoinHandle<()>>,
}

impl<S: Send + 'static> MutationBatcher<S> {
    /// Create a batcher owning `state` with the default debounce window.
    pub fn new(state: S) -> Self {
        Self::with_debounce(state, DEFAULT_DEBOUNCE)
    }

    /// Create a batcher with a custom debounce window.
    pub fn with_debounce(state: S, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BatchInner {
                state,
                queue: HashMap::new(),
                next_seq: 0,
                epoch: 0,
                timer: None,
            })),
            debounce,
        }
    }

    /// Queue an updater under `key`, superseding any pending one.
    ///
    /// Resets the debounce timer. Concurrent updates for different keys
    /// are never lost; updates for the same key collapse to the most
    /// recent one.
    pub fn queue_update<F>(&self, key: impl Into<String>, updater: F)
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        let mut inner = self.inner.lock().unwrap();

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.queue.insert(key.into(), (seq, Box::new(updater)));

        inner.epoch += 1;
        let epoch = inner.epoch;
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }

        let weak = Arc::downgrade(&self.inner);
        let debounce = self.debounce;
        inner.timer = Some(tokio::spawn(async move {
            time::sleep(debounce).await;
            Self::fire(weak, epoch);
        }));
    }

    /// Apply an updater immediately, bypassing the queue and timer.
    pub fn set_immediate<F>(&self, updater: F)
    where
        F: FnOnce(&mut S),
    {
        let mut inner = self.inner.lock().unwrap();
        updater(&mut inner.state);
    }

    /// Cancel any pending timer and apply the queue synchronously.
    ///
    /// On return the queue is empty and no timer is pending.
    pub fn flush_updates(&self) {
        let mut inner = self.inner.lock().unwrap();
        Self::drain(&mut inner);
    }

    /// Read the current state.
    pub fn with_state<R>(&self, reader: impl FnOnce(&S) -> R) -> R {
        let inner = self.inner.lock().unwrap();
        reader(&inner.state)
    }

    /// Number of updates waiting for the next batch cycle.
    pub fn pending_updates(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    fn fire(weak: Weak<Mutex<BatchInner<S>>>, epoch: u64) {
        if let Some(inner) = weak.upgrade() {
            let mut inner = inner.lock().unwrap();
            // A newer enqueue re-armed the timer; this firing is stale
            if inner.epoch == epoch {
                Self::drain(&mut inner);
            }
        }
    }

    fn drain(inner: &mut BatchInner<S>) {
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        if inner.queue.is_empty() {
            return;
        }

        let mut batch: Vec<(u64, Updater<S>)> = inner.queue.drain().map(|(_, v)| v).collect();
        batch.sort_by_key(|(seq, _)| *seq);

        let applied = batch.len();
        for (_, updater) in batch {
            updater(&mut inner.state);
        }
        tracing::debug!(applied, "flushed mutation batch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_batcher() -> MutationBatcher<Vec<i32>> {
        MutationBatcher::new(Vec::new())
    }

    #[tokio::test(start_paused = true)]
    async fn same_key_collapses_to_most_recent() {
        let batcher = log_batcher();
        batcher.queue_update("x", |log| log.push(1));
        batcher.queue_update("x", |log| log.push(2));

        time::sleep(Duration::from_millis(100)).await;

        batcher.with_state(|log| assert_eq!(log, &vec![2]));
    }

    #[tokio::test(start_paused = true)]
    async fn replay_follows_most_recent_enqueue_order() {
        let batcher = log_batcher();
        batcher.queue_update("a", |log| log.push(1));
        batcher.queue_update("b", |log| log.push(2));
        // Superseding "a" moves it behind "b" in the replay order
        batcher.queue_update("a", |log| log.push(3));

        batcher.flush_updates();

        batcher.with_state(|log| assert_eq!(log, &vec![2, 3]));
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_are_never_lost() {
        let batcher = log_batcher();
        batcher.queue_update("a", |log| log.push(1));
        batcher.queue_update("b", |log| log.push(2));
        batcher.queue_update("c", |log| log.push(3));

        time::sleep(Duration::from_millis(100)).await;

        batcher.with_state(|log| assert_eq!(log, &vec![1, 2, 3]));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_once_after_debounce_window() {
        let batcher = log_batcher();
        batcher.queue_update("x", |log| log.push(1));

        // Window not yet elapsed
        time::sleep(Duration::from_millis(30)).await;
        batcher.with_state(|log| assert!(log.is_empty()));

        time::sleep(Duration::from_millis(30)).await;
        batcher.with_state(|log| assert_eq!(log, &vec![1]));
        assert_eq!(batcher.pending_updates(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_resets_the_debounce_timer() {
        let batcher = log_batcher();
        batcher.queue_update("x", |log| log.push(1));

        time::sleep(Duration::from_millis(30)).await;
        batcher.queue_update("x", |log| log.push(2));

        // 60ms after the first enqueue, but only 30ms after the reset
        time::sleep(Duration::from_millis(30)).await;
        batcher.with_state(|log| assert!(log.is_empty()));

        time::sleep(Duration::from_millis(30)).await;
        batcher.with_state(|log| assert_eq!(log, &vec![2]));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_cancels_timer_and_empties_queue() {
        let batcher = log_batcher();
        batcher.queue_update("x", |log| log.push(1));

        batcher.flush_updates();
        batcher.with_state(|log| assert_eq!(log, &vec![1]));
        assert_eq!(batcher.pending_updates(), 0);

        // The aborted timer must not replay the batch
        time::sleep(Duration::from_millis(200)).await;
        batcher.with_state(|log| assert_eq!(log, &vec![1]));
    }

    #[tokio::test(start_paused = true)]
    async fn set_immediate_bypasses_the_queue() {
        let batcher = log_batcher();
        batcher.queue_update("x", |log| log.push(2));
        batcher.set_immediate(|log| log.push(1));

        batcher.with_state(|log| assert_eq!(log, &vec![1]));
        batcher.flush_updates();
        batcher.with_state(|log| assert_eq!(log, &vec![1, 2]));
    }
}
