//! Engine error taxonomy.
//!
//! User-supplied stage code (readers, writers, mappers, processors) reports
//! failures as plain [`anyhow::Error`]s; the engine classifies them into
//! [`BatchError`] variants so that abort/continue policy is a pure function
//! of the variant and the job configuration.
//!
//! Only a fatal read, a threshold-triggered abort, and an unrecovered write
//! failure change a job's terminal status. Everything else is accounted in
//! the job metrics and the loop continues. Validation rejections are stage
//! outcomes, not errors, and never appear here. Close failures during
//! teardown are logged and swallowed.

use thiserror::Error;

/// Classified failures raised while driving a batch job.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The record reader could not be opened. Fatal.
    #[error("unable to open record reader: {0}")]
    ReaderOpen(#[source] anyhow::Error),

    /// The record writer could not be opened. Fatal.
    #[error("unable to open record writer: {0}")]
    WriterOpen(#[source] anyhow::Error),

    /// The reader failed mid-stream. Fatal: there is no valid record to
    /// account the failure against, so the error threshold does not apply.
    #[error("unable to read next record: {0}")]
    Read(#[source] anyhow::Error),

    /// A mapping stage failed for one record.
    #[error("unable to map record: {0}")]
    Mapping(#[source] anyhow::Error),

    /// A processing stage failed for one record.
    #[error("unable to process record: {0}")]
    Processing(#[source] anyhow::Error),

    /// The writer rejected a batch.
    #[error("unable to write records: {0}")]
    Write(#[source] anyhow::Error),

    /// A dispatcher could not hand a record to a target queue, typically
    /// because every consumer hung up.
    #[error("unable to dispatch record: {0}")]
    Dispatch(String),

    /// The configured error threshold was reached.
    #[error("error threshold of {threshold} reached, aborting execution")]
    ErrorThresholdExceeded {
        /// The configured threshold.
        threshold: u64,
    },
}
