// weblog2parquet-storage - Object storage capability and Parquet output
//
// Wraps OpenDAL behind the small `LogStore` capability the pipeline consumes:
// a resumable sorted key listing, object fetch, and artifact write. Also owns
// the Parquet day-file writer that serializes Arrow batches and uploads the
// finished file.

mod day_file;
mod store;

pub use day_file::{writer_properties, DayFileWriter};
pub use store::{KeyPage, LogStore, OpendalStore};
