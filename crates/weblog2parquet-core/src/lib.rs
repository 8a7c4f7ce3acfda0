// weblog2parquet-core - Access-log line parsing and Arrow conversion
//
// Pure data-shaping layer: the line grammar, the closed field set, the typed
// row, and the row-to-Arrow column builders. No I/O happens here.

mod columns;
mod fields;
mod parser;
mod schema;

pub use columns::RowBatchBuilder;
pub use fields::{LogField, ParsedFields, PROJECTED_FIELDS};
pub use parser::{build_row, FormatError, LineParser, LogRow};
pub use schema::{access_log_schema, access_log_schema_arc};
