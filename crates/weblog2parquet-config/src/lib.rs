// weblog2parquet-config - Runtime configuration
//
// Sources, in priority order:
// 1. Environment variables (WEBLOG2PARQUET_* overrides, AWS_* credentials)
// 2. Config file passed on the command line (--config)
// 3. Default config file locations (./config.toml, ./.weblog2parquet.toml)
// 4. Built-in defaults

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod sources;
mod validation;

pub use sources::{EnvSource, StdEnvSource};

/// Main runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Tuning for the batch pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Ingest workers per batch.
    pub worker_count: usize,
    /// Keys pulled from the listing per refill.
    pub list_chunk: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            worker_count: 32,
            list_chunk: 1000,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            fs: None,
            s3: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Fs,
    S3,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            "s3" | "aws" => Ok(StorageBackend::S3),
            _ => anyhow::bail!("Unsupported storage backend: {}. Supported: fs, s3", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    /// Local directory standing in for the bucket root.
    pub root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct S3Config {
    /// Region; AWS_REGION overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Credentials resolved from the process environment. Never read from the
/// config file.
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl RuntimeConfig {
    /// Load configuration: defaults, then an optional file, then environment
    /// overrides, then validation.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        sources::load_config(config_file, &StdEnvSource)
    }

    /// As `load`, but with an injectable environment (for tests).
    pub fn load_with_env(config_file: Option<&Path>, env: &dyn EnvSource) -> Result<Self> {
        sources::load_config(config_file, env)
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Resolve AWS credentials for the S3 backend. `Ok(None)` when the
    /// backend needs none; any missing variable is a configuration error.
    pub fn aws_credentials(&self, env: &dyn EnvSource) -> Result<Option<AwsCredentials>> {
        if self.storage.backend != StorageBackend::S3 {
            return Ok(None);
        }
        let require = |key: &str| {
            env.get_raw(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} must be set for the s3 backend"))
        };
        let access_key_id = require("AWS_ACCESS_KEY_ID")?;
        let secret_access_key = require("AWS_SECRET_ACCESS_KEY")?;
        let region = match env
            .get_raw("AWS_REGION")
            .filter(|v| !v.is_empty())
            .or_else(|| self.storage.s3.as_ref().and_then(|s3| s3.region.clone()))
        {
            Some(region) => region,
            None => anyhow::bail!(
                "AWS_REGION must be set (or storage.s3.region configured) for the s3 backend"
            ),
        };
        Ok(Some(AwsCredentials {
            access_key_id,
            secret_access_key,
            region,
        }))
    }
}
