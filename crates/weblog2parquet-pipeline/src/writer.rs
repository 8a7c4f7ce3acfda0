// Single-consumer batch writer.
//
// Drains the line channel, turns lines into typed rows, and accumulates them
// in Arrow builders, flushing a row group to the day file every
// `ROWS_PER_FLUSH` rows. Malformed lines are logged and dropped without
// being counted, so the post-batch comparison against the workers' appended
// totals flags parse-drop loss as well as transport loss.

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use weblog2parquet_core::{build_row, LineParser, RowBatchBuilder};
use weblog2parquet_storage::{DayFileWriter, LogStore};

/// Row-group size, matched to the Parquet writer properties.
const ROWS_PER_FLUSH: usize = 32 * 1024;

pub struct BatchWriter {
    lines: UnboundedReceiver<String>,
    done: CancellationToken,
    parser: LineParser,
    builder: RowBatchBuilder,
    day_file: DayFileWriter,
    lines_processed: u64,
}

impl BatchWriter {
    pub fn new(
        lines: UnboundedReceiver<String>,
        done: CancellationToken,
        destination: &str,
    ) -> Result<Self> {
        Ok(Self {
            lines,
            done,
            parser: LineParser::new(),
            builder: RowBatchBuilder::new(),
            day_file: DayFileWriter::create(destination)?,
            lines_processed: 0,
        })
    }

    /// Consume lines until the registry signals completion (or every sender
    /// is gone), then close and upload the day file. Returns the number of
    /// lines that produced a row.
    pub async fn run(mut self, store: &dyn LogStore) -> Result<u64> {
        loop {
            tokio::select! {
                maybe = self.lines.recv() => match maybe {
                    Some(line) => self.process_line(&line)?,
                    // All senders dropped; backstop for the done token.
                    None => break,
                },
                _ = self.done.cancelled() => {
                    // Workers enqueue everything before deregistering, so a
                    // non-blocking drain sees the stragglers.
                    while let Ok(line) = self.lines.try_recv() {
                        self.process_line(&line)?;
                    }
                    break;
                }
            }
        }

        if !self.builder.is_empty() {
            let batch = self.builder.finish()?;
            self.day_file.append(&batch)?;
        }

        let rows = self.day_file.rows();
        let path = self.day_file.finish(store).await?;
        info!(
            path = %path,
            lines = self.lines_processed,
            rows,
            "day file written"
        );
        Ok(self.lines_processed)
    }

    fn process_line(&mut self, line: &str) -> Result<()> {
        match build_row(&self.parser.parse(line)) {
            Ok(Some(row)) => {
                self.lines_processed += 1;
                self.builder.append(&row);
                if self.builder.len() >= ROWS_PER_FLUSH {
                    let batch = self.builder.finish()?;
                    self.day_file.append(&batch)?;
                }
            }
            Ok(None) => {
                debug!(line, "line did not match the grammar, dropped");
            }
            Err(error) => {
                warn!(%error, line, "malformed line dropped");
            }
        }
        Ok(())
    }
}
