//! Fluent construction of [`BatchJob`] instances.
//!
//! ```
//! use batchflow::job::{Job, JobBuilder};
//! use batchflow::reader::IterableRecordReader;
//! use batchflow::writer::{CollectionRecordWriter, shared_collection};
//!
//! let sink = shared_collection();
//! let mut job = JobBuilder::new("squares")
//!     .reader(IterableRecordReader::new(vec![1u32, 2, 3]))
//!     .processor(|r: batchflow::record::Record<u32>| Ok(Some(r.map_payload(|x| x * x))))
//!     .writer(CollectionRecordWriter::new(sink.clone()))
//!     .batch_size(2)
//!     .build();
//! let report = job.execute();
//! assert_eq!(*sink.lock().unwrap(), vec![1, 4, 9]);
//! # let _ = report;
//! ```

use crate::filter::RecordFilter;
use crate::job::{BatchJob, JobMonitor, JobParameters};
use crate::listener::{
    BatchListener, JobListener, PipelineListener, RecordReaderListener, RecordWriterListener,
};
use crate::mapper::RecordMapper;
use crate::processor::RecordProcessor;
use crate::reader::RecordReader;
use crate::record::Payload;
use crate::validator::RecordValidator;
use crate::writer::RecordWriter;
use std::sync::Arc;

/// Builder for [`BatchJob`].
///
/// The payload type may change exactly once, at the mapping stage: start
/// with [`JobBuilder::new`] for an untyped (`O = I`) pipeline, or
/// [`JobBuilder::with_mapper`] when raw records are converted to a domain
/// type. Filters observe the pre-mapping type `I`; validators, processors,
/// and the writer see the mapped type `O`.
pub struct JobBuilder<I: Payload, O: Payload> {
    job: BatchJob<I, O>,
}

impl<I: Payload> JobBuilder<I, I> {
    /// Start a job whose records keep their payload type end to end.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            job: BatchJob::new(JobParameters::new(name)),
        }
    }
}

impl<I: Payload, O: Payload> JobBuilder<I, O> {
    /// Start a job whose mapping stage converts `Record<I>` to `Record<O>`.
    pub fn with_mapper(
        name: impl Into<String>,
        mapper: impl RecordMapper<I, O> + 'static,
    ) -> Self {
        Self {
            job: BatchJob::with_mapper(JobParameters::new(name), Box::new(mapper)),
        }
    }

    /// Set the record reader. Defaults to a reader that is always empty.
    #[must_use]
    pub fn reader(mut self, reader: impl RecordReader<I> + 'static) -> Self {
        self.job.reader = Box::new(reader);
        self
    }

    /// Register a filter. Filters run in registration order; the first
    /// match drops the record.
    #[must_use]
    pub fn filter(mut self, filter: impl RecordFilter<I> + 'static) -> Self {
        self.job.filters.push(Box::new(filter));
        self
    }

    /// Register a validator. Validators run in registration order; the
    /// first rejection wins.
    #[must_use]
    pub fn validator(mut self, validator: impl RecordValidator<O> + 'static) -> Self {
        self.job.validators.push(Box::new(validator));
        self
    }

    /// Append a processor to the end of the processing chain.
    #[must_use]
    pub fn processor(mut self, processor: impl RecordProcessor<O> + 'static) -> Self {
        self.job.processors.add(Box::new(processor));
        self
    }

    /// Set the record writer. Defaults to a writer that discards batches.
    #[must_use]
    pub fn writer(mut self, writer: impl RecordWriter<O> + 'static) -> Self {
        self.job.writer = Box::new(writer);
        self
    }

    /// Number of records per written batch (default 1).
    ///
    /// # Panics
    ///
    /// Panics if `batch_size` is zero.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size >= 1, "batch size must be at least 1");
        self.job.parameters.batch_size = batch_size;
        self
    }

    /// Abort the run once this many per-record errors have accumulated
    /// (default: unbounded).
    #[must_use]
    pub fn error_threshold(mut self, threshold: u64) -> Self {
        self.job.parameters.error_threshold = Some(threshold);
        self
    }

    /// Abort on the first mapping or processing error (default off).
    #[must_use]
    pub fn strict_mode(mut self, enabled: bool) -> Self {
        self.job.parameters.strict_mode = enabled;
        self
    }

    /// Abort on the first validation rejection (default off).
    #[must_use]
    pub fn abort_on_first_reject(mut self, enabled: bool) -> Self {
        self.job.parameters.abort_on_first_reject = enabled;
        self
    }

    /// Abort on the first mapping error, even outside strict mode
    /// (default off).
    #[must_use]
    pub fn abort_on_first_mapping_error(mut self, enabled: bool) -> Self {
        self.job.parameters.abort_on_first_mapping_error = enabled;
        self
    }

    /// Count a failed batch's records as errors and keep going instead of
    /// failing the job (default off).
    #[must_use]
    pub fn continue_on_write_error(mut self, enabled: bool) -> Self {
        self.job.parameters.continue_on_write_error = enabled;
        self
    }

    /// Register a job lifecycle listener.
    #[must_use]
    pub fn job_listener(mut self, listener: Arc<dyn JobListener>) -> Self {
        self.job.job_listener.add(listener);
        self
    }

    /// Register a batch boundary listener.
    #[must_use]
    pub fn batch_listener(mut self, listener: Arc<dyn BatchListener<O>>) -> Self {
        self.job.batch_listener.add(listener);
        self
    }

    /// Register a record reader listener.
    #[must_use]
    pub fn reader_listener(mut self, listener: Arc<dyn RecordReaderListener<I>>) -> Self {
        self.job.reader_listener.add(listener);
        self
    }

    /// Register a record writer listener.
    #[must_use]
    pub fn writer_listener(mut self, listener: Arc<dyn RecordWriterListener<O>>) -> Self {
        self.job.writer_listener.add(listener);
        self
    }

    /// Register a pipeline stage listener.
    #[must_use]
    pub fn pipeline_listener(mut self, listener: Arc<dyn PipelineListener<I, O>>) -> Self {
        self.job.pipeline_listener.add(listener);
        self
    }

    /// Inject the monitoring observer and enable report snapshots.
    #[must_use]
    pub fn monitor(mut self, monitor: Arc<dyn JobMonitor>) -> Self {
        self.job.monitor = Some(monitor);
        self.job.parameters.monitoring_enabled = true;
        self
    }

    /// Finish the builder.
    #[must_use]
    pub fn build(mut self) -> BatchJob<I, O> {
        // The report carries the final parameters, including everything set
        // after construction.
        self.job.report = crate::job::JobReport::new(self.job.parameters.clone());
        self.job
    }
}
