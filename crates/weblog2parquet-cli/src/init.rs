// Initialization utilities: logging setup and storage backend construction.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use weblog2parquet_config::{RuntimeConfig, StdEnvSource, StorageBackend};
use weblog2parquet_storage::{LogStore, OpendalStore};

pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = match log_level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("weblog2parquet=info")),
    };

    // Ignore the error if a subscriber is already set (idempotent)
    let _ = tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer()),
    );
}

/// Build a store for one bucket/prefix pair from the configured backend.
/// Credentials come from the environment and are checked before anything
/// is listed or written.
pub fn build_store(
    config: &RuntimeConfig,
    bucket: &str,
    prefix: &str,
) -> Result<Arc<dyn LogStore>> {
    match config.storage.backend {
        StorageBackend::Fs => {
            let fs = config
                .storage
                .fs
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("fs config required for filesystem backend"))?;
            // The bucket becomes a directory under the configured root.
            let root = format!("{}/{}", fs.root.trim_end_matches('/'), bucket);
            info!(root = %root, "using filesystem storage");
            Ok(Arc::new(OpendalStore::new_fs(&root, prefix)?))
        }
        StorageBackend::S3 => {
            let credentials = config
                .aws_credentials(&StdEnvSource)?
                .ok_or_else(|| anyhow::anyhow!("s3 backend did not resolve credentials"))?;
            let endpoint = config
                .storage
                .s3
                .as_ref()
                .and_then(|s3| s3.endpoint.as_deref());
            info!(bucket, region = %credentials.region, "using S3 storage");
            Ok(Arc::new(OpendalStore::new_s3(
                bucket,
                &credentials.region,
                endpoint,
                Some(&credentials.access_key_id),
                Some(&credentials.secret_access_key),
                prefix,
            )?))
        }
    }
}
