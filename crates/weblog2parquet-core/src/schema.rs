// Fixed Arrow schema for processed access-log rows.
//
// Column order matches `PROJECTED_FIELDS` and the `LogRow` layout; downstream
// query engines rely on this order staying stable.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use once_cell::sync::Lazy;
use std::sync::Arc;

pub fn access_log_schema() -> Schema {
    Schema::new(vec![
        Field::new("bucket_name", DataType::Utf8, false),
        Field::new(
            "request_date",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
        Field::new("remote_ip", DataType::Utf8, false),
        Field::new("operation", DataType::Utf8, false),
        Field::new("key", DataType::Utf8, false),
        Field::new("request_uri", DataType::Utf8, false),
        Field::new("http_status", DataType::Int32, false),
        Field::new("total_time", DataType::Int32, false),
        Field::new("referrer", DataType::Utf8, false),
        Field::new("user_agent", DataType::Utf8, false),
        Field::new("version_id", DataType::Utf8, false),
        // Only present on log lines carrying the trailing extension fields.
        Field::new("end_point", DataType::Utf8, true),
    ])
}

/// Shared schema instance; avoids re-allocating per batch.
pub fn access_log_schema_arc() -> SchemaRef {
    static SCHEMA: Lazy<SchemaRef> = Lazy::new(|| Arc::new(access_log_schema()));
    SCHEMA.clone()
}
