// OpenDAL-backed storage capability.
//
// The pipeline consumes storage through the `LogStore` trait: list keys in
// sorted order after a watermark, fetch one object's bytes, write one output
// artifact. Production backends are S3 and the local filesystem; tests wrap a
// memory operator via `with_operator`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use opendal::Operator;

/// One page of a sorted key listing. `truncated` signals that more keys may
/// follow the last one returned.
#[derive(Debug, Clone, Default)]
pub struct KeyPage {
    pub keys: Vec<String>,
    pub truncated: bool,
}

#[async_trait]
pub trait LogStore: Send + Sync {
    /// List up to `max_keys` keys strictly after `start_after`, in
    /// lexicographic order. An empty page means the listing is exhausted.
    async fn list_after(&self, start_after: Option<&str>, max_keys: usize) -> Result<KeyPage>;

    /// Fetch one object's bytes.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>>;

    /// Write one output artifact, replacing any existing object at `path`.
    async fn write(&self, path: &str, data: Vec<u8>) -> Result<()>;
}

#[derive(Clone)]
pub struct OpendalStore {
    operator: Operator,
    prefix: String,
}

impl OpendalStore {
    /// Wrap an already-built operator; the listing is scoped to `prefix`
    /// (a directory-style prefix, normalized to end with `/`).
    pub fn with_operator(operator: Operator, prefix: &str) -> Self {
        Self {
            operator,
            prefix: normalize_prefix(prefix),
        }
    }

    #[cfg(feature = "services-s3")]
    pub fn new_s3(
        bucket: &str,
        region: &str,
        endpoint: Option<&str>,
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
        prefix: &str,
    ) -> Result<Self> {
        use opendal::services;

        let mut builder = services::S3::default().bucket(bucket).region(region);
        if let Some(ep) = endpoint {
            builder = builder.endpoint(ep);
        }
        if let Some(key) = access_key_id {
            builder = builder.access_key_id(key);
        }
        if let Some(secret) = secret_access_key {
            builder = builder.secret_access_key(secret);
        }

        let operator = Operator::new(builder)?.finish();
        Ok(Self::with_operator(operator, prefix))
    }

    #[cfg(feature = "services-fs")]
    pub fn new_fs(root: &str, prefix: &str) -> Result<Self> {
        use opendal::services;

        let builder = services::Fs::default().root(root);
        let operator = Operator::new(builder)?.finish();
        Ok(Self::with_operator(operator, prefix))
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("{trimmed}/")
    }
}

#[async_trait]
impl LogStore for OpendalStore {
    async fn list_after(&self, start_after: Option<&str>, max_keys: usize) -> Result<KeyPage> {
        // Services that implement start-after (S3) resume server-side and
        // hand back keys already in sorted order, so the stream can stop as
        // soon as the page is full. Other services (memory, fs) are drained
        // past the watermark and sorted here, since fs in particular lists
        // in directory-entry order.
        let native_resume = self
            .operator
            .info()
            .full_capability()
            .list_with_start_after;

        let mut builder = self.operator.lister_with(&self.prefix).recursive(true);
        if native_resume {
            if let Some(after) = start_after {
                builder = builder.start_after(after);
            }
        }
        let mut lister = builder
            .await
            .with_context(|| format!("listing objects under {}", self.prefix))?;

        if native_resume {
            let mut keys = Vec::new();
            while let Some(entry) = lister.try_next().await? {
                if !entry.metadata().is_file() {
                    continue;
                }
                keys.push(entry.path().to_string());
                if keys.len() >= max_keys {
                    return Ok(KeyPage {
                        keys,
                        truncated: true,
                    });
                }
            }
            return Ok(KeyPage {
                keys,
                truncated: false,
            });
        }

        let mut keys = Vec::new();
        while let Some(entry) = lister.try_next().await? {
            if !entry.metadata().is_file() {
                continue;
            }
            let path = entry.path();
            if start_after.is_some_and(|after| path <= after) {
                continue;
            }
            keys.push(path.to_string());
        }
        keys.sort_unstable();
        let truncated = keys.len() > max_keys;
        keys.truncate(max_keys);
        Ok(KeyPage { keys, truncated })
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let data = self
            .operator
            .read(key)
            .await
            .with_context(|| format!("fetching object {key}"))?;
        Ok(data.to_vec())
    }

    async fn write(&self, path: &str, data: Vec<u8>) -> Result<()> {
        self.operator
            .write(path, data)
            .await
            .with_context(|| format!("writing artifact {path}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opendal::services;

    async fn seeded_store(keys: &[&str]) -> OpendalStore {
        let op = Operator::new(services::Memory::default()).unwrap().finish();
        for key in keys {
            op.write(key, format!("contents of {key}").into_bytes())
                .await
                .unwrap();
        }
        OpendalStore::with_operator(op, "logs")
    }

    #[tokio::test]
    async fn lists_keys_in_sorted_order_after_watermark() {
        let store = seeded_store(&[
            "logs/access-2021-01-01-a",
            "logs/access-2021-01-01-b",
            "logs/access-2021-01-02-a",
        ])
        .await;

        let page = store.list_after(None, 10).await.unwrap();
        assert_eq!(
            page.keys,
            vec![
                "logs/access-2021-01-01-a",
                "logs/access-2021-01-01-b",
                "logs/access-2021-01-02-a",
            ]
        );
        assert!(!page.truncated);

        let resumed = store
            .list_after(Some("logs/access-2021-01-01-b"), 10)
            .await
            .unwrap();
        assert_eq!(resumed.keys, vec!["logs/access-2021-01-02-a"]);
    }

    #[tokio::test]
    async fn short_pages_report_truncation() {
        let store = seeded_store(&["logs/k1", "logs/k2", "logs/k3"]).await;

        let page = store.list_after(None, 2).await.unwrap();
        assert_eq!(page.keys.len(), 2);
        assert!(page.truncated);

        let rest = store.list_after(Some(&page.keys[1]), 2).await.unwrap();
        assert_eq!(rest.keys, vec!["logs/k3"]);
        assert!(!rest.truncated);
    }

    #[tokio::test]
    async fn watermark_between_keys_resumes_strictly_after() {
        let store = seeded_store(&["logs/k1", "logs/k3", "logs/k5"]).await;

        // The watermark need not name an existing key.
        let page = store.list_after(Some("logs/k2"), 10).await.unwrap();
        assert_eq!(page.keys, vec!["logs/k3", "logs/k5"]);

        // A watermark equal to an existing key excludes that key.
        let page = store.list_after(Some("logs/k3"), 10).await.unwrap();
        assert_eq!(page.keys, vec!["logs/k5"]);
    }

    #[tokio::test]
    async fn fs_listing_comes_back_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let op = Operator::new(services::Fs::default().root(&dir.path().to_string_lossy()))
            .unwrap()
            .finish();
        // Created out of lexicographic order; directory-entry order is
        // whatever the OS hands back.
        for key in ["logs/c", "logs/a", "logs/d", "logs/b"] {
            op.write(key, b"x".to_vec()).await.unwrap();
        }
        let store = OpendalStore::with_operator(op, "logs");

        let page = store.list_after(None, 10).await.unwrap();
        assert_eq!(page.keys, vec!["logs/a", "logs/b", "logs/c", "logs/d"]);

        let resumed = store.list_after(Some("logs/b"), 1).await.unwrap();
        assert_eq!(resumed.keys, vec!["logs/c"]);
        assert!(resumed.truncated);
    }

    #[tokio::test]
    async fn empty_prefix_lists_nothing() {
        let store = seeded_store(&[]).await;
        let page = store.list_after(None, 10).await.unwrap();
        assert!(page.keys.is_empty());
        assert!(!page.truncated);
    }

    #[tokio::test]
    async fn fetch_returns_object_bytes() {
        let store = seeded_store(&["logs/k1"]).await;
        let bytes = store.fetch("logs/k1").await.unwrap();
        assert_eq!(bytes, b"contents of logs/k1");
    }

    #[tokio::test]
    async fn write_replaces_existing_artifact() {
        let store = seeded_store(&[]).await;
        store.write("out/file", b"one".to_vec()).await.unwrap();
        store.write("out/file", b"two".to_vec()).await.unwrap();
        assert_eq!(store.fetch("out/file").await.unwrap(), b"two");
    }
}
