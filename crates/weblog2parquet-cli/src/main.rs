use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use weblog2parquet_config::RuntimeConfig;
use weblog2parquet_pipeline::{BatchPipelineRunner, PipelineConfig};

mod init;

use init::{build_store, init_tracing};

/// Batch job converting S3 web access logs into daily Parquet files
#[derive(Parser)]
#[command(name = "weblog2parquet")]
#[command(version)]
#[command(about = "Convert S3 web access logs into one Parquet file per day", long_about = None)]
struct Cli {
    /// Bucket holding the raw access-log objects
    #[arg(long, value_name = "BUCKET")]
    log_bucket: String,

    /// Bucket the daily Parquet files are written to
    #[arg(long, value_name = "BUCKET")]
    output_bucket: String,

    /// Key prefix of the log objects within the log bucket
    #[arg(long, value_name = "PREFIX", default_value = "")]
    log_path_prefix: String,

    /// Key prefix for the Parquet files within the output bucket
    #[arg(long, value_name = "PREFIX", default_value = "")]
    output_path_prefix: String,

    /// Site the logs belong to; names the output files
    #[arg(long, value_name = "DOMAIN")]
    domain_name: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    // Runtime errors are logged and handled; the exit code stays zero so a
    // scheduler retry is driven by the logs, not by the process status.
    if let Err(error) = run(cli) {
        error!("{error:#}");
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let config = RuntimeConfig::load(cli.config.as_deref())?;

    let source = build_store(&config, &cli.log_bucket, &cli.log_path_prefix)?;
    // The runner composes destination paths; the sink store is only ever
    // written to, so it carries no listing prefix.
    let sink = build_store(&config, &cli.output_bucket, "")?;

    let mut pipeline = PipelineConfig::new(&cli.domain_name, &cli.output_path_prefix);
    pipeline.worker_count = config.pipeline.worker_count;
    pipeline.list_chunk = config.pipeline.list_chunk;

    info!(
        log_bucket = %cli.log_bucket,
        output_bucket = %cli.output_bucket,
        domain = %cli.domain_name,
        workers = pipeline.worker_count,
        "starting weblog2parquet"
    );

    let summary = BatchPipelineRunner::new(source, sink, pipeline).run().await?;
    info!(
        batches = summary.batches,
        lines = summary.lines,
        "all completed days processed"
    );
    Ok(())
}
