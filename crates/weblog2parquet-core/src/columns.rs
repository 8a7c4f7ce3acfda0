// Row-to-Arrow conversion.
//
// Accumulates typed rows in per-column builders and snapshots them into a
// RecordBatch when the consumer decides a row group is full.

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int32Builder, RecordBatch, StringBuilder, TimestampMillisecondBuilder};
use std::sync::Arc;

use crate::parser::LogRow;
use crate::schema::access_log_schema_arc;

/// Default capacity for builders when the expected row count is unknown.
const DEFAULT_BUILDER_CAPACITY: usize = 1024;

pub struct RowBatchBuilder {
    bucket: StringBuilder,
    request_date: TimestampMillisecondBuilder,
    remote_ip: StringBuilder,
    operation: StringBuilder,
    key: StringBuilder,
    request_uri: StringBuilder,
    http_status: Int32Builder,
    total_time: Int32Builder,
    referrer: StringBuilder,
    user_agent: StringBuilder,
    version_id: StringBuilder,
    end_point: StringBuilder,
    len: usize,
}

impl RowBatchBuilder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUILDER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bucket: StringBuilder::with_capacity(capacity, capacity * 16),
            request_date: TimestampMillisecondBuilder::with_capacity(capacity),
            remote_ip: StringBuilder::with_capacity(capacity, capacity * 16),
            operation: StringBuilder::with_capacity(capacity, capacity * 16),
            key: StringBuilder::with_capacity(capacity, capacity * 32),
            request_uri: StringBuilder::with_capacity(capacity, capacity * 48),
            http_status: Int32Builder::with_capacity(capacity),
            total_time: Int32Builder::with_capacity(capacity),
            referrer: StringBuilder::with_capacity(capacity, capacity * 32),
            user_agent: StringBuilder::with_capacity(capacity, capacity * 64),
            version_id: StringBuilder::with_capacity(capacity, capacity * 8),
            end_point: StringBuilder::with_capacity(capacity, capacity * 24),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn append(&mut self, row: &LogRow) {
        self.bucket.append_value(&row.bucket);
        self.request_date
            .append_value(row.timestamp.and_utc().timestamp_millis());
        self.remote_ip.append_value(&row.remote_ip);
        self.operation.append_value(&row.operation);
        self.key.append_value(&row.key);
        self.request_uri.append_value(&row.request_uri);
        self.http_status.append_value(row.http_status);
        self.total_time.append_value(row.total_time);
        self.referrer.append_value(&row.referrer);
        self.user_agent.append_value(&row.user_agent);
        self.version_id.append_value(&row.version_id);
        self.end_point.append_option(row.endpoint.as_deref());
        self.len += 1;
    }

    /// Snapshot the accumulated rows into a RecordBatch and reset the
    /// builders for the next row group.
    pub fn finish(&mut self) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(self.bucket.finish()),
            Arc::new(self.request_date.finish()),
            Arc::new(self.remote_ip.finish()),
            Arc::new(self.operation.finish()),
            Arc::new(self.key.finish()),
            Arc::new(self.request_uri.finish()),
            Arc::new(self.http_status.finish()),
            Arc::new(self.total_time.finish()),
            Arc::new(self.referrer.finish()),
            Arc::new(self.user_agent.finish()),
            Arc::new(self.version_id.finish()),
            Arc::new(self.end_point.finish()),
        ];
        self.len = 0;
        RecordBatch::try_new(access_log_schema_arc(), columns)
            .context("building access-log record batch")
    }
}

impl Default for RowBatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}
