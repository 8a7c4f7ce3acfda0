// Configuration validation
//
// Checks required fields are present and values are sensible before any
// batching starts.

use crate::{PipelineSettings, RuntimeConfig, StorageBackend, StorageConfig};
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_pipeline_settings(&config.pipeline)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

fn validate_pipeline_settings(settings: &PipelineSettings) -> Result<()> {
    if settings.worker_count == 0 {
        bail!("pipeline.worker_count must be greater than 0");
    }
    if settings.list_chunk == 0 {
        bail!("pipeline.list_chunk must be greater than 0");
    }
    if settings.worker_count > 256 {
        warn!(
            worker_count = settings.worker_count,
            "pipeline.worker_count is very large; fetches will contend on the store"
        );
    }
    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    match config.backend {
        StorageBackend::Fs => {
            let fs = config
                .fs
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("fs storage backend requires 'fs' configuration"))?;
            if fs.root.is_empty() {
                bail!("storage.fs.root must not be empty");
            }
        }
        StorageBackend::S3 => {
            // Region and credentials come from the environment; only an
            // explicitly empty region in the file is rejected here.
            if let Some(s3) = &config.s3 {
                if matches!(&s3.region, Some(region) if region.is_empty()) {
                    bail!("storage.s3.region must not be empty when set");
                }
                if matches!(&s3.endpoint, Some(endpoint) if endpoint.is_empty()) {
                    bail!("storage.s3.endpoint must not be empty when set");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FsConfig, S3Config};

    #[test]
    fn zero_worker_count_is_rejected() {
        let settings = PipelineSettings {
            worker_count: 0,
            list_chunk: 100,
        };
        assert!(validate_pipeline_settings(&settings).is_err());
    }

    #[test]
    fn fs_backend_requires_a_root() {
        let missing = StorageConfig {
            backend: StorageBackend::Fs,
            fs: None,
            s3: None,
        };
        assert!(validate_storage_config(&missing).is_err());

        let empty = StorageConfig {
            backend: StorageBackend::Fs,
            fs: Some(FsConfig {
                root: String::new(),
            }),
            s3: None,
        };
        assert!(validate_storage_config(&empty).is_err());

        let valid = StorageConfig {
            backend: StorageBackend::Fs,
            fs: Some(FsConfig {
                root: "/var/logs".to_string(),
            }),
            s3: None,
        };
        assert!(validate_storage_config(&valid).is_ok());
    }

    #[test]
    fn s3_backend_allows_absent_section() {
        let bare = StorageConfig {
            backend: StorageBackend::S3,
            fs: None,
            s3: None,
        };
        assert!(validate_storage_config(&bare).is_ok());

        let empty_region = StorageConfig {
            backend: StorageBackend::S3,
            fs: None,
            s3: Some(S3Config {
                region: Some(String::new()),
                endpoint: None,
            }),
        };
        assert!(validate_storage_config(&empty_region).is_err());
    }
}
