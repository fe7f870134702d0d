//! Lifecycle listeners and their ordered composites.
//!
//! Listeners observe the engine at job, batch, pipeline-stage, reader, and
//! writer granularity. Each composite holds an ordered list of delegates:
//! "before" events fire in registration order, "after" and "on-exception"
//! events fire in **reverse** registration order — the nesting discipline of
//! decorators, where the last-registered delegate wraps innermost and so
//! sees "before" last and "after" first.
//!
//! Listener methods are infallible by signature; a misbehaving observer
//! cannot affect pipeline correctness. Callbacks run synchronously on the
//! job's own thread, so a slow listener stalls only that job.

use crate::job::{JobParameters, JobReport};
use crate::record::{Batch, Record};
use anyhow::Error;
use std::sync::Arc;

/// Observes job start and end.
pub trait JobListener: Send + Sync {
    /// Called before the job opens its reader and writer.
    fn before_job(&self, _parameters: &JobParameters) {}

    /// Called after the job has produced its final report.
    fn after_job(&self, _report: &JobReport) {}
}

/// Observes batch boundaries.
pub trait BatchListener<P>: Send + Sync {
    /// Called before the engine starts reading a new batch.
    fn before_batch_reading(&self) {}

    /// Called once the batch has been read and processed, before writing.
    fn after_batch_processing(&self, _batch: &Batch<P>) {}

    /// Called after the batch was successfully written.
    fn after_batch_writing(&self, _batch: &Batch<P>) {}

    /// Called when the writer rejected the batch.
    fn on_batch_writing_exception(&self, _batch: &Batch<P>, _error: &Error) {}
}

/// Observes individual record reads.
pub trait RecordReaderListener<P>: Send + Sync {
    /// Called before each read attempt.
    fn before_record_reading(&self) {}

    /// Called after a read; `None` signals end-of-stream.
    fn after_record_reading(&self, _record: Option<&Record<P>>) {}

    /// Called when the reader failed. The job fails right after.
    fn on_record_reading_exception(&self, _error: &Error) {}
}

/// Observes batch writes at record-writer granularity.
pub trait RecordWriterListener<P>: Send + Sync {
    /// Called before handing the batch to the writer.
    fn before_record_writing(&self, _batch: &Batch<P>) {}

    /// Called after a successful write.
    fn after_record_writing(&self, _batch: &Batch<P>) {}

    /// Called when the write failed.
    fn on_record_writing_exception(&self, _batch: &Batch<P>, _error: &Error) {}
}

/// Observes records en route through the stage pipeline.
///
/// `before_record_processing` threads its return value to the next
/// delegate, so listeners can transform the record before it enters the
/// mapping stage. The after/exception callbacks only observe.
pub trait PipelineListener<I, O>: Send + Sync {
    /// Called before the record enters the mapping stage; the returned
    /// record is what flows onward.
    fn before_record_processing(&self, record: Record<I>) -> Record<I> {
        record
    }

    /// Called after the record left the pipeline; `processed` is `None`
    /// when a processor dropped it.
    fn after_record_processing(&self, _record: &Record<I>, _processed: Option<&Record<O>>) {}

    /// Called when a mapping or processing stage failed for the record.
    fn on_record_processing_exception(&self, _record: &Record<I>, _error: &Error) {}
}

/// Ordered fan-out of [`JobListener`] callbacks.
#[derive(Default)]
pub struct CompositeJobListener {
    delegates: Vec<Arc<dyn JobListener>>,
}

impl CompositeJobListener {
    /// Register a delegate at the end of the list.
    pub fn add(&mut self, listener: Arc<dyn JobListener>) {
        self.delegates.push(listener);
    }
}

impl JobListener for CompositeJobListener {
    fn before_job(&self, parameters: &JobParameters) {
        for l in &self.delegates {
            l.before_job(parameters);
        }
    }

    fn after_job(&self, report: &JobReport) {
        for l in self.delegates.iter().rev() {
            l.after_job(report);
        }
    }
}

/// Ordered fan-out of [`BatchListener`] callbacks.
pub struct CompositeBatchListener<P> {
    delegates: Vec<Arc<dyn BatchListener<P>>>,
}

impl<P> CompositeBatchListener<P> {
    /// Register a delegate at the end of the list.
    pub fn add(&mut self, listener: Arc<dyn BatchListener<P>>) {
        self.delegates.push(listener);
    }
}

impl<P> Default for CompositeBatchListener<P> {
    fn default() -> Self {
        Self {
            delegates: Vec::new(),
        }
    }
}

impl<P> BatchListener<P> for CompositeBatchListener<P> {
    fn before_batch_reading(&self) {
        for l in &self.delegates {
            l.before_batch_reading();
        }
    }

    fn after_batch_processing(&self, batch: &Batch<P>) {
        for l in self.delegates.iter().rev() {
            l.after_batch_processing(batch);
        }
    }

    fn after_batch_writing(&self, batch: &Batch<P>) {
        for l in self.delegates.iter().rev() {
            l.after_batch_writing(batch);
        }
    }

    fn on_batch_writing_exception(&self, batch: &Batch<P>, error: &Error) {
        for l in self.delegates.iter().rev() {
            l.on_batch_writing_exception(batch, error);
        }
    }
}

/// Ordered fan-out of [`RecordReaderListener`] callbacks.
pub struct CompositeRecordReaderListener<P> {
    delegates: Vec<Arc<dyn RecordReaderListener<P>>>,
}

impl<P> CompositeRecordReaderListener<P> {
    /// Register a delegate at the end of the list.
    pub fn add(&mut self, listener: Arc<dyn RecordReaderListener<P>>) {
        self.delegates.push(listener);
    }
}

impl<P> Default for CompositeRecordReaderListener<P> {
    fn default() -> Self {
        Self {
            delegates: Vec::new(),
        }
    }
}

impl<P> RecordReaderListener<P> for CompositeRecordReaderListener<P> {
    fn before_record_reading(&self) {
        for l in &self.delegates {
            l.before_record_reading();
        }
    }

    fn after_record_reading(&self, record: Option<&Record<P>>) {
        for l in self.delegates.iter().rev() {
            l.after_record_reading(record);
        }
    }

    fn on_record_reading_exception(&self, error: &Error) {
        for l in self.delegates.iter().rev() {
            l.on_record_reading_exception(error);
        }
    }
}

/// Ordered fan-out of [`RecordWriterListener`] callbacks.
pub struct CompositeRecordWriterListener<P> {
    delegates: Vec<Arc<dyn RecordWriterListener<P>>>,
}

impl<P> CompositeRecordWriterListener<P> {
    /// Register a delegate at the end of the list.
    pub fn add(&mut self, listener: Arc<dyn RecordWriterListener<P>>) {
        self.delegates.push(listener);
    }
}

impl<P> Default for CompositeRecordWriterListener<P> {
    fn default() -> Self {
        Self {
            delegates: Vec::new(),
        }
    }
}

impl<P> RecordWriterListener<P> for CompositeRecordWriterListener<P> {
    fn before_record_writing(&self, batch: &Batch<P>) {
        for l in &self.delegates {
            l.before_record_writing(batch);
        }
    }

    fn after_record_writing(&self, batch: &Batch<P>) {
        for l in self.delegates.iter().rev() {
            l.after_record_writing(batch);
        }
    }

    fn on_record_writing_exception(&self, batch: &Batch<P>, error: &Error) {
        for l in self.delegates.iter().rev() {
            l.on_record_writing_exception(batch, error);
        }
    }
}

/// Ordered fan-out of [`PipelineListener`] callbacks.
pub struct CompositePipelineListener<I, O> {
    delegates: Vec<Arc<dyn PipelineListener<I, O>>>,
}

impl<I, O> CompositePipelineListener<I, O> {
    /// Register a delegate at the end of the list.
    pub fn add(&mut self, listener: Arc<dyn PipelineListener<I, O>>) {
        self.delegates.push(listener);
    }
}

impl<I, O> Default for CompositePipelineListener<I, O> {
    fn default() -> Self {
        Self {
            delegates: Vec::new(),
        }
    }
}

impl<I, O> PipelineListener<I, O> for CompositePipelineListener<I, O> {
    fn before_record_processing(&self, record: Record<I>) -> Record<I> {
        self.delegates
            .iter()
            .fold(record, |r, l| l.before_record_processing(r))
    }

    fn after_record_processing(&self, record: &Record<I>, processed: Option<&Record<O>>) {
        for l in self.delegates.iter().rev() {
            l.after_record_processing(record, processed);
        }
    }

    fn on_record_processing_exception(&self, record: &Record<I>, error: &Error) {
        for l in self.delegates.iter().rev() {
            l.on_record_processing_exception(record, error);
        }
    }
}
