// Batch orchestration.
//
// Drives the whole job: discover the next day's key batch, run one writer
// plus a pool of ingest workers over it, reconcile the line counts, repeat.
// The batch for the current date is still written, then the run halts.

use anyhow::{Context, Result};
use chrono::Local;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};

use weblog2parquet_storage::LogStore;

use crate::batcher::{DateBatcher, KeyBatch};
use crate::cursor::KeyCursor;
use crate::distributor::WorkDistributor;
use crate::registry::CompletionRegistry;
use crate::worker::IngestWorker;
use crate::writer::BatchWriter;

const DEFAULT_WORKER_COUNT: usize = 32;
const DEFAULT_LIST_CHUNK: usize = 1000;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub worker_count: usize,
    pub list_chunk: usize,
    /// Site the logs belong to; names the output files.
    pub domain: String,
    /// Prefix (within the output store) the day files are written under.
    pub output_path_prefix: String,
}

impl PipelineConfig {
    pub fn new(domain: &str, output_path_prefix: &str) -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            list_chunk: DEFAULT_LIST_CHUNK,
            domain: domain.to_string(),
            output_path_prefix: output_path_prefix.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub lines: u64,
}

pub struct BatchPipelineRunner {
    source: Arc<dyn LogStore>,
    sink: Arc<dyn LogStore>,
    config: PipelineConfig,
}

impl BatchPipelineRunner {
    pub fn new(
        source: Arc<dyn LogStore>,
        sink: Arc<dyn LogStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    /// Process every discovered day, oldest first. The batch carrying the
    /// current date is still written, but the run halts right after it:
    /// that day may keep receiving objects, so no further batch is sought.
    pub async fn run(&self) -> Result<RunSummary> {
        let cursor = KeyCursor::new(self.source.clone());
        let mut batcher = DateBatcher::with_chunk(cursor, self.config.list_chunk);
        let today = Local::now().format("%Y-%m-%d").to_string();

        let mut summary = RunSummary::default();
        while let Some(batch) = batcher.next_batch().await? {
            summary.lines += self.run_batch(&batch).await?;
            summary.batches += 1;
            if batch.date >= today {
                info!(date = %batch.date, "processed the current day, stopping");
                break;
            }
        }
        info!(
            batches = summary.batches,
            lines = summary.lines,
            "pipeline run complete"
        );
        Ok(summary)
    }

    /// Destination path for one day's file within the sink store.
    fn destination(&self, date: &str) -> String {
        let file_name = format!("{}.{date}.parquet", self.config.domain);
        match self.config.output_path_prefix.trim_matches('/') {
            "" => file_name,
            prefix => format!("{prefix}/{file_name}"),
        }
    }

    /// Run one batch: N workers feeding one writer. Returns the lines the
    /// writer processed; a writer failure is logged and reported as zero so
    /// the run can move on to the next day.
    async fn run_batch(&self, batch: &KeyBatch) -> Result<u64> {
        let destination = self.destination(&batch.date);
        info!(
            date = %batch.date,
            keys = batch.keys.len(),
            destination = %destination,
            "starting batch"
        );

        let registry = Arc::new(CompletionRegistry::new());
        let distributor = Arc::new(WorkDistributor::new(batch.keys.clone()));
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let writer = BatchWriter::new(line_rx, registry.done_token(), &destination)?;

        // Register every worker before any of them runs, so an early
        // finisher cannot cancel the writer while siblings are starting.
        let mut workers = JoinSet::new();
        for _ in 0..self.config.worker_count.max(1) {
            let worker = IngestWorker::new(
                distributor.clone(),
                self.source.clone(),
                registry.clone(),
                line_tx.clone(),
            );
            workers.spawn(worker.run());
        }
        drop(line_tx);

        let sink = self.sink.clone();
        let writer_task = tokio::spawn(async move { writer.run(sink.as_ref()).await });

        while let Some(joined) = workers.join_next().await {
            joined.context("ingest worker task panicked")??;
        }

        let lines_written = match writer_task.await {
            Ok(Ok(lines)) => lines,
            Ok(Err(error)) => {
                error!(date = %batch.date, %error, "day file write failed, batch skipped");
                return Ok(0);
            }
            Err(error) => {
                error!(date = %batch.date, %error, "writer task panicked, batch skipped");
                return Ok(0);
            }
        };

        let lines_read = registry.total_lines();
        if lines_read != lines_written {
            error!(
                date = %batch.date,
                lines_read,
                lines_written,
                "line count mismatch between workers and writer"
            );
        } else {
            info!(date = %batch.date, lines = lines_written, "batch complete");
        }
        Ok(lines_written)
    }
}
