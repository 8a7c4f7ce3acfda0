// weblog2parquet-pipeline - Concurrent batch ingestion
//
// The moving parts of the daily batch job: a resumable key cursor over the
// storage listing, a date batcher that groups keys into calendar days, a
// work distributor feeding a pool of ingest workers, a completion registry
// that signals the writer when the last worker finishes, and the runner that
// drives one writer plus N workers per batch.

mod batcher;
mod cursor;
mod distributor;
mod registry;
mod runner;
mod worker;
mod writer;

pub use batcher::{DateBatcher, KeyBatch};
pub use cursor::KeyCursor;
pub use distributor::WorkDistributor;
pub use registry::{CompletionRegistry, RegistryError};
pub use runner::{BatchPipelineRunner, PipelineConfig, RunSummary};
pub use worker::IngestWorker;
pub use writer::BatchWriter;
