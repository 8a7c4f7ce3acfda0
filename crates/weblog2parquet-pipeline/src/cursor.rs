// Resumable cursor over the sorted storage listing.
//
// Remembers the last key it handed out and asks the store only for keys
// strictly after it, so successive calls never re-return a key.

use anyhow::Result;
use std::sync::Arc;

use weblog2parquet_storage::LogStore;

pub struct KeyCursor {
    store: Arc<dyn LogStore>,
    last_key: Option<String>,
}

impl KeyCursor {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            last_key: None,
        }
    }

    /// Return up to `limit` keys past the cursor position, advancing it.
    /// An empty vec means the listing is exhausted (for now; a later call
    /// will pick up keys that arrive after the watermark).
    pub async fn list(&mut self, limit: usize) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        while keys.len() < limit {
            let remaining = limit - keys.len();
            let page = self
                .store
                .list_after(self.last_key.as_deref(), remaining)
                .await?;
            if let Some(last) = page.keys.last() {
                self.last_key = Some(last.clone());
            }
            let exhausted = !page.truncated;
            keys.extend(page.keys);
            if exhausted {
                break;
            }
        }
        Ok(keys)
    }
}
