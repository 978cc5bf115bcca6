//! Background persistence writer.
//!
//! Every mutating store operation enqueues one [`WriteBatch`] describing
//! the provider writes it requires, in order. A single background task
//! drains the queue FIFO, so the steps of one call are sequenced and two
//! calls' batches never interleave: once the queue is idle, provider state
//! matches the in-memory cache.
//!
//! Failures inside a batch are reported through the logging side channel,
//! never to the caller: the in-memory result and events were already
//! visible when the batch was enqueued. Callers that need durability
//! confirmation await the [`WriteReceipt`].

use larder_storage::StorageProvider;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// One provider write, fully resolved to its storage key.
#[derive(Debug, Clone)]
pub(crate) enum WriteStep {
    SetItem(String, Value),
    RemoveItem(String),
    SetMetadata(String, Value),
    RemoveMetadata(String),
}

struct WriteBatch {
    steps: Vec<WriteStep>,
    done: oneshot::Sender<()>,
}

/// Completion handle for the provider writes triggered by one call.
///
/// The in-memory result and any events are final before this settles;
/// waiting is only needed for durability confirmation. A receipt from an
/// operation that triggered no writes settles immediately.
#[derive(Debug)]
pub struct WriteReceipt {
    done: Option<oneshot::Receiver<()>>,
}

impl WriteReceipt {
    fn pending(done: oneshot::Receiver<()>) -> Self {
        Self { done: Some(done) }
    }

    /// A receipt that is already settled (no writes were triggered).
    pub fn settled() -> Self {
        Self { done: None }
    }

    /// Wait until every provider write in the batch has been applied (or
    /// logged as failed).
    pub async fn wait(self) {
        if let Some(done) = self.done {
            // A dropped sender means the writer task is gone; there is
            // nothing left to wait for.
            let _ = done.await;
        }
    }
}

/// Handle to the background writer task.
pub(crate) struct Writer {
    queue: mpsc::UnboundedSender<WriteBatch>,
}

impl Writer {
    /// Spawn the writer task. Must be called within a tokio runtime.
    pub(crate) fn spawn(provider: Arc<dyn StorageProvider>) -> Self {
        let (queue, mut batches) = mpsc::unbounded_channel::<WriteBatch>();
        tokio::spawn(async move {
            while let Some(batch) = batches.recv().await {
                for step in batch.steps {
                    apply(provider.as_ref(), step).await;
                }
                // The receipt may have been dropped; completion is then
                // nobody's business.
                let _ = batch.done.send(());
            }
        });
        Self { queue }
    }

    /// Enqueue one call's writes as a single ordered batch.
    pub(crate) fn enqueue(&self, steps: Vec<WriteStep>) -> WriteReceipt {
        if steps.is_empty() {
            return WriteReceipt::settled();
        }
        let (done, receipt) = oneshot::channel();
        if self.queue.send(WriteBatch { steps, done }).is_err() {
            tracing::error!("persistence writer is gone; dropping write batch");
            return WriteReceipt::settled();
        }
        WriteReceipt::pending(receipt)
    }
}

async fn apply(provider: &dyn StorageProvider, step: WriteStep) {
    match step {
        WriteStep::SetItem(key, value) => {
            if let Err(e) = provider.set_item(&key, &value).await {
                tracing::error!(error = %e, key = %key, "item write failed");
            }
        }
        WriteStep::RemoveItem(key) => {
            if let Err(e) = provider.remove_item(&key).await {
                tracing::error!(error = %e, key = %key, "item removal failed");
            }
        }
        WriteStep::SetMetadata(key, value) => {
            if let Err(e) = provider.set_metadata(&key, &value).await {
                tracing::error!(error = %e, key = %key, "metadata write failed");
            }
        }
        WriteStep::RemoveMetadata(key) => {
            if let Err(e) = provider.remove_metadata(&key).await {
                tracing::error!(error = %e, key = %key, "metadata removal failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_storage::MemoryProvider;
    use serde_json::json;

    #[tokio::test]
    async fn batches_apply_in_enqueue_order() {
        let provider = Arc::new(MemoryProvider::new());
        let writer = Writer::spawn(provider.clone());

        // Two batches writing the same key: the later one must win.
        let first = writer.enqueue(vec![WriteStep::SetItem("ns:k".to_string(), json!(1))]);
        let second = writer.enqueue(vec![WriteStep::SetItem("ns:k".to_string(), json!(2))]);

        first.wait().await;
        second.wait().await;
        assert_eq!(provider.item("ns:k"), Some(json!(2)));
    }

    #[tokio::test]
    async fn steps_within_a_batch_are_sequenced() {
        let provider = Arc::new(MemoryProvider::new());
        let writer = Writer::spawn(provider.clone());

        writer
            .enqueue(vec![
                WriteStep::SetItem("ns:k".to_string(), json!("v")),
                WriteStep::SetMetadata("ns#index:primary".to_string(), json!(["k"])),
                WriteStep::RemoveItem("ns:k".to_string()),
            ])
            .wait()
            .await;

        assert_eq!(provider.item("ns:k"), None);
        assert_eq!(
            provider.metadata_value("ns#index:primary"),
            Some(json!(["k"]))
        );
    }

    #[tokio::test]
    async fn empty_batch_settles_immediately() {
        let provider = Arc::new(MemoryProvider::new());
        let writer = Writer::spawn(provider);
        writer.enqueue(Vec::new()).wait().await;
    }
}
