//! Trailing-edge debouncer on tokio timers.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Invokes the callback once `delay` has passed without another call; each
/// call replaces the pending argument (last write wins). Must be used from
/// inside a tokio runtime. Dropping the debouncer cancels a pending call.
pub struct Debouncer<T> {
    delay: Duration,
    callback: Callback<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self { delay, callback: Arc::new(callback), pending: Mutex::new(None) }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn call(&self, arg: T) {
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback(arg);
        });
        if let Some(previous) = self.slot().replace(task) {
            trace!("Debounced call superseded");
            previous.abort();
        }
    }

    /// Abort the pending invocation. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.slot().take() {
            Some(task) => {
                let pending = !task.is_finished();
                task.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot().as_ref().is_some_and(|task| !task.is_finished())
    }

    fn slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let slot = self.pending.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |v| sink.lock().unwrap().push(v))
    }

    #[tokio::test(start_paused = true)]
    async fn burst_invokes_once_with_last_argument() {
        let (seen, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(100), callback);
        for i in 0..5 {
            debouncer.call(i);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(debouncer.is_pending());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*seen.lock().unwrap(), vec![4]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_calls_each_fire() {
        let (seen, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(50), callback);
        debouncer.call(1);
        tokio::time::sleep(Duration::from_millis(80)).await;
        debouncer.call(2);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_abort_pending_call() {
        let (seen, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(50), callback);
        debouncer.call(1);
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        debouncer.call(2);
        drop(debouncer);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(seen.lock().unwrap().is_empty());
    }
}
