// Parquet day-file writer.
//
// One writer per (domain, date) output file. Batches are appended as they
// arrive; `finish` closes the Parquet footer and uploads the buffered bytes
// through the store.

use anyhow::{Context, Result};
use arrow::array::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use std::sync::OnceLock;
use tracing::debug;

use weblog2parquet_core::access_log_schema_arc;

use crate::store::LogStore;

/// Shared writer properties, built once. Tuned for scan-heavy day files:
/// dictionary encoding on, page statistics, moderate ZSTD.
pub fn writer_properties() -> &'static WriterProperties {
    static PROPS: OnceLock<WriterProperties> = OnceLock::new();
    PROPS.get_or_init(|| {
        WriterProperties::builder()
            .set_dictionary_enabled(true)
            .set_statistics_enabled(EnabledStatistics::Page)
            .set_compression(Compression::ZSTD(
                ZstdLevel::try_new(2).unwrap_or_default(),
            ))
            .set_data_page_size_limit(256 * 1024)
            .set_dictionary_page_size_limit(128 * 1024)
            .set_write_batch_size(32 * 1024)
            .set_max_row_group_size(32 * 1024)
            .build()
    })
}

pub struct DayFileWriter {
    writer: ArrowWriter<Vec<u8>>,
    path: String,
    rows: usize,
}

impl DayFileWriter {
    /// Open a new in-memory Parquet file destined for `path`.
    pub fn create(path: &str) -> Result<Self> {
        let writer = ArrowWriter::try_new(
            Vec::new(),
            access_log_schema_arc(),
            Some(writer_properties().clone()),
        )
        .with_context(|| format!("opening parquet writer for {path}"))?;
        Ok(Self {
            writer,
            path: path.to_string(),
            rows: 0,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn append(&mut self, batch: &RecordBatch) -> Result<()> {
        self.rows += batch.num_rows();
        self.writer
            .write(batch)
            .with_context(|| format!("appending batch to {}", self.path))
    }

    /// Close the Parquet footer and upload the file. Returns the destination
    /// path for logging.
    pub async fn finish(self, store: &dyn LogStore) -> Result<String> {
        let path = self.path;
        let rows = self.rows;
        let bytes = self
            .writer
            .into_inner()
            .with_context(|| format!("closing parquet file {path}"))?;
        debug!(path = %path, rows, bytes = bytes.len(), "uploading day file");
        store.write(&path, bytes).await?;
        Ok(path)
    }
}
