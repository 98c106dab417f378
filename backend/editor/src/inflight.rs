//! Re-entrancy guard for async actions.
//!
//! While one invocation is pending, further invocations are rejected
//! without polling their futures. The flag is held by an RAII token, so it
//! resets when the pending call settles or is dropped.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

/// Held while an invocation is pending.
#[derive(Debug)]
pub struct InFlightToken {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn try_acquire(&self) -> Option<InFlightToken> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightToken { busy: Arc::clone(&self.busy) })
    }

    /// Run `fut` unless a previous call is still pending, in which case
    /// `fut` is dropped unpolled and `None` is returned.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let Some(_token) = self.try_acquire() else {
            debug!("Call already in flight, skipping");
            return None;
        };
        Some(fut.await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn rejects_while_pending_and_resets_after() {
        let guard = InFlight::new();
        let release = Arc::new(Notify::new());
        let polled = Arc::new(AtomicUsize::new(0));

        let first = {
            let guard = guard.clone();
            let release = release.clone();
            tokio::spawn(async move { guard.run(async move { release.notified().await; 1 }).await })
        };
        tokio::task::yield_now().await;
        assert!(guard.is_busy());

        let counter = polled.clone();
        let second = guard.run(async move { counter.fetch_add(1, Ordering::SeqCst); 2 }).await;
        assert_eq!(second, None);
        assert_eq!(polled.load(Ordering::SeqCst), 0);

        release.notify_one();
        assert_eq!(first.await.unwrap(), Some(1));
        assert!(!guard.is_busy());
        assert_eq!(guard.run(async { 3 }).await, Some(3));
    }

    #[test]
    fn token_drop_releases() {
        let guard = InFlight::new();
        let token = guard.try_acquire();
        assert!(token.is_some());
        assert!(guard.try_acquire().is_none());
        drop(token);
        assert!(guard.try_acquire().is_some());
    }
}
