//! Trailing-Edge Debouncer
//!
//! Collapses bursts of calls into a single run of an async action, fired
//! once the calls have been quiet for the configured delay. Runs on the
//! tokio runtime; `flush` runs the action immediately and drops any run
//! that is still waiting.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default quiet period before the debounced action runs
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

type BoxedAction = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Debounced async action.
///
/// Each `call()` re-arms the delay; only the last call inside a window runs.
#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
    action: BoxedAction,
}

impl Debouncer {
    pub fn new<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            action: Arc::new(move || Box::pin(action())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule the action, cancelling the run scheduled by any earlier call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn call(&self) {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let action = Arc::clone(&self.action);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == ticket {
                action().await;
            }
        });
    }

    /// Run the action now and discard the pending run, if any.
    pub async fn flush(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        (self.action)().await;
    }

    /// Discard the pending run without running the action.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}
