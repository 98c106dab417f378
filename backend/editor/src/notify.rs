//! Debounced change notifications for hosts that persist Markdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::debounce::Debouncer;
use crate::events::EditorEvent;
use crate::store::EditorStore;

/// Call `on_change(version, markdown)` once the document has been quiet for
/// `delay`. Bursts of edits produce one call with the latest content.
/// Aborting the returned task stops the watcher and any pending call.
pub async fn watch_markdown<F>(store: Arc<Mutex<EditorStore>>, delay: Duration, on_change: F) -> JoinHandle<()>
where
    F: Fn(u64, String) + Send + Sync + 'static,
{
    let mut events = store.lock().await.subscribe();
    let on_change = Arc::new(on_change);

    tokio::spawn(async move {
        let notify = {
            let store = Arc::clone(&store);
            Debouncer::new(delay, move |version: u64| {
                let store = Arc::clone(&store);
                let on_change = Arc::clone(&on_change);
                tokio::spawn(async move {
                    let markdown = store.lock().await.get_markdown();
                    on_change(version, markdown);
                });
            })
        };

        loop {
            match events.recv().await {
                Ok(EditorEvent::ContentChanged { version, .. }) => notify.call(version),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Change watcher lagged behind the event bus");
                    let version = store.lock().await.version();
                    notify.call(version);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_of_edits_notifies_once() {
        let store = Arc::new(Mutex::new(EditorStore::default()));
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let watcher = watch_markdown(Arc::clone(&store), Duration::from_millis(50), move |version, md| {
            sink.lock().unwrap().push((version, md));
        })
        .await;

        {
            let mut store = store.lock().await;
            store.set_markdown("one");
            store.set_markdown("two");
            store.set_markdown("three");
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*seen.lock().unwrap(), vec![(3, "three".to_string())]);

        store.lock().await.set_markdown("four");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(seen.lock().unwrap().len(), 2);
        watcher.abort();
    }
}
