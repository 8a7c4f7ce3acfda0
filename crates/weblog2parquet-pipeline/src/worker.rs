// Ingest worker: pulls keys, fetches objects, feeds lines to the writer.
//
// Registration happens in the constructor, before the task is spawned, so
// the registry can never observe an empty set while workers are still being
// built. A fetch failure skips that object and moves on; the batch's other
// objects are still worth processing.

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use weblog2parquet_storage::LogStore;

use crate::distributor::WorkDistributor;
use crate::registry::{CompletionRegistry, RegistryError};

pub struct IngestWorker {
    id: u64,
    distributor: Arc<WorkDistributor>,
    store: Arc<dyn LogStore>,
    registry: Arc<CompletionRegistry>,
    lines: UnboundedSender<String>,
}

impl IngestWorker {
    /// Build and register a worker. Must be called before spawning its task.
    pub fn new(
        distributor: Arc<WorkDistributor>,
        store: Arc<dyn LogStore>,
        registry: Arc<CompletionRegistry>,
        lines: UnboundedSender<String>,
    ) -> Self {
        let id = registry.register();
        Self {
            id,
            distributor,
            store,
            registry,
            lines,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Drain the distributor, sending every non-blank line of every fetched
    /// object. Always deregisters, reporting the appended-line count.
    pub async fn run(self) -> Result<(), RegistryError> {
        let mut appended: u64 = 0;

        'keys: while let Some(key) = self.distributor.take_next() {
            let bytes = match self.store.fetch(&key).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(worker = self.id, key = %key, %error, "fetch failed, skipping object");
                    continue;
                }
            };
            let text = String::from_utf8_lossy(&bytes);
            for line in text.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                if self.lines.send(line.to_string()).is_err() {
                    // Writer is gone; nothing left to feed.
                    debug!(worker = self.id, "line channel closed, stopping");
                    break 'keys;
                }
                appended += 1;
            }
        }

        self.registry.deregister(self.id, appended)
    }
}
