//! The read-process-write engine driving one job.
//!
//! A [`BatchJob`] is strictly sequential: one thread drives
//! read → filter → map → validate → process → write with no internal
//! fan-out. Concurrency comes from running several jobs in parallel through
//! the [`JobExecutor`](crate::job::JobExecutor) and connecting them with
//! dispatcher queues.
//!
//! Each record's trip through the stages produces an explicit outcome —
//! carried on, filtered, skipped, rejected, or errored — and the
//! abort/continue decision is a pure function of that outcome and the job
//! parameters. No error escapes [`Job::execute`]: errors are data in the
//! final [`JobReport`].

use crate::error::BatchError;
use crate::filter::RecordFilter;
use crate::job::{JobMonitor, JobParameters, JobReport, JobStatus};
use crate::listener::{
    BatchListener, CompositeBatchListener, CompositeJobListener, CompositePipelineListener,
    CompositeRecordReaderListener, CompositeRecordWriterListener, JobListener, PipelineListener,
    RecordReaderListener, RecordWriterListener,
};
use crate::mapper::RecordMapper;
use crate::processor::{CompositeRecordProcessor, RecordProcessor};
use crate::reader::RecordReader;
use crate::record::{Batch, Payload, Record};
use crate::validator::RecordValidator;
use crate::writer::RecordWriter;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info};

/// One configured, runnable instance of the pipeline.
pub trait Job: Send {
    /// The job's name.
    fn name(&self) -> &str;

    /// Run the job to completion and return its report. Never panics on
    /// stage failures and never returns an error: failures terminate the
    /// run with status `Failed` or `Aborted` inside the report.
    fn execute(&mut self) -> JobReport;
}

/// Why the engine left its loop before exhausting the source.
enum Termination {
    /// An abort policy fired (threshold, strict mode, abort-on-first
    /// flags).
    Aborted(String),
    /// A fatal error killed the run.
    Failed(BatchError),
}

/// Implementation of the read-process-write job pattern.
///
/// Build instances through [`JobBuilder`](crate::job::JobBuilder).
pub struct BatchJob<I: Payload, O: Payload> {
    pub(crate) parameters: JobParameters,
    pub(crate) reader: Box<dyn RecordReader<I>>,
    pub(crate) filters: Vec<Box<dyn RecordFilter<I>>>,
    pub(crate) mapper: Box<dyn RecordMapper<I, O>>,
    pub(crate) validators: Vec<Box<dyn RecordValidator<O>>>,
    pub(crate) processors: CompositeRecordProcessor<O>,
    pub(crate) writer: Box<dyn RecordWriter<O>>,
    pub(crate) job_listener: CompositeJobListener,
    pub(crate) batch_listener: CompositeBatchListener<O>,
    pub(crate) reader_listener: CompositeRecordReaderListener<I>,
    pub(crate) writer_listener: CompositeRecordWriterListener<O>,
    pub(crate) pipeline_listener: CompositePipelineListener<I, O>,
    pub(crate) monitor: Option<Arc<dyn JobMonitor>>,
    pub(crate) report: JobReport,
    more_records: bool,
}

impl<I: Payload, O: Payload> BatchJob<I, O> {
    pub(crate) fn new(parameters: JobParameters) -> Self
    where
        crate::mapper::IdentityRecordMapper: RecordMapper<I, O>,
    {
        Self::with_mapper(parameters, Box::new(crate::mapper::IdentityRecordMapper))
    }

    pub(crate) fn with_mapper(
        parameters: JobParameters,
        mapper: Box<dyn RecordMapper<I, O>>,
    ) -> Self {
        let report = JobReport::new(parameters.clone());
        Self {
            parameters,
            reader: Box::new(crate::reader::NoOpRecordReader),
            filters: Vec::new(),
            mapper,
            validators: Vec::new(),
            processors: CompositeRecordProcessor::new(),
            writer: Box::new(crate::writer::NoOpRecordWriter),
            job_listener: CompositeJobListener::default(),
            batch_listener: CompositeBatchListener::default(),
            reader_listener: CompositeRecordReaderListener::default(),
            writer_listener: CompositeRecordWriterListener::default(),
            pipeline_listener: CompositePipelineListener::default(),
            monitor: None,
            report,
            more_records: true,
        }
    }

    fn start(&mut self) {
        self.set_status(JobStatus::Starting);
        self.job_listener.before_job(&self.parameters);
        self.report.metrics.start_time = Some(SystemTime::now());
        debug!(batch_size = self.parameters.batch_size, "starting job");
        match self.parameters.error_threshold {
            Some(threshold) => debug!(threshold, "error threshold"),
            None => debug!("error threshold: unbounded"),
        }
    }

    fn set_status(&mut self, status: JobStatus) {
        info!(job = %self.parameters.name, %status, "job status");
        self.report.status = status;
    }

    fn run(&mut self) -> Result<(), Termination> {
        self.open_reader()?;
        self.open_writer()?;
        self.set_status(JobStatus::Started);
        while self.more_records {
            let batch = self.read_and_process_batch()?;
            self.write_batch(&batch)?;
            self.notify_monitor();
        }
        Ok(())
    }

    fn open_reader(&mut self) -> Result<(), Termination> {
        debug!("opening record reader");
        self.reader
            .open()
            .map_err(|e| Termination::Failed(BatchError::ReaderOpen(e)))?;
        self.report.data_source = self.reader.data_source();
        Ok(())
    }

    fn open_writer(&mut self) -> Result<(), Termination> {
        debug!("opening record writer");
        self.writer
            .open()
            .map_err(|e| Termination::Failed(BatchError::WriterOpen(e)))
    }

    /// Read up to `batch_size` records, pushing each through the stage
    /// pipeline; survivors accumulate into the returned batch.
    fn read_and_process_batch(&mut self) -> Result<Batch<O>, Termination> {
        let mut batch = Batch::with_capacity(self.parameters.batch_size);
        self.batch_listener.before_batch_reading();
        for _ in 0..self.parameters.batch_size {
            match self.read_record()? {
                None => {
                    debug!("no more records");
                    self.more_records = false;
                    break;
                }
                Some(record) => {
                    self.report.metrics.read_count += 1;
                    self.process_record(record, &mut batch)?;
                }
            }
        }
        self.batch_listener.after_batch_processing(&batch);
        Ok(batch)
    }

    fn read_record(&mut self) -> Result<Option<Record<I>>, Termination> {
        self.reader_listener.before_record_reading();
        match self.reader.read_record() {
            Ok(record) => {
                self.reader_listener.after_record_reading(record.as_ref());
                Ok(record)
            }
            Err(e) => {
                // Fatal: there is no valid record to account this failure
                // against, so the error threshold does not apply.
                self.reader_listener.on_record_reading_exception(&e);
                Err(Termination::Failed(BatchError::Read(e)))
            }
        }
    }

    /// Drive one record through filter, map, validate, and process.
    fn process_record(
        &mut self,
        record: Record<I>,
        batch: &mut Batch<O>,
    ) -> Result<(), Termination> {
        let record = self.pipeline_listener.before_record_processing(record);
        let snapshot = record.clone();

        // Filter: first match short-circuits the remaining stages.
        if self.filters.iter().any(|f| f.matches(&record)) {
            debug!(record = %record.header(), "record filtered");
            self.report.metrics.filter_count += 1;
            self.pipeline_listener.after_record_processing(&snapshot, None);
            return self.check_error_threshold();
        }

        // Map: convert the payload to the domain type.
        let mapped = match self.mapper.map_record(record) {
            Ok(mapped) => mapped,
            Err(e) => {
                error!(record = %snapshot.header(), "unable to map record: {e}");
                self.pipeline_listener
                    .on_record_processing_exception(&snapshot, &e);
                self.report.metrics.error_count += 1;
                self.report.metrics.increment_metric("mapping_errors", 1);
                self.report.last_error = Some(format!("{:#}", BatchError::Mapping(e)));
                if self.parameters.strict_mode || self.parameters.abort_on_first_mapping_error {
                    return Err(Termination::Aborted(
                        "mapping error in strict mode".to_string(),
                    ));
                }
                return self.check_error_threshold();
            }
        };

        // Validate: first rejection wins; rejections are skips, not errors.
        if let Some(rejection) = self
            .validators
            .iter()
            .find_map(|v| v.validate(&mapped).err())
        {
            debug!(record = %mapped.header(), %rejection, "record rejected");
            self.report.metrics.skip_count += 1;
            self.report.metrics.increment_metric("rejected_records", 1);
            self.pipeline_listener.after_record_processing(&snapshot, None);
            if self.parameters.abort_on_first_reject {
                return Err(Termination::Aborted(format!(
                    "record rejected: {rejection}"
                )));
            }
            return self.check_error_threshold();
        }

        // Process: ordered chain; a dropped record is not an error.
        match self.processors.process_record(mapped) {
            Ok(Some(processed)) => {
                self.pipeline_listener
                    .after_record_processing(&snapshot, Some(&processed));
                batch.add(processed);
            }
            Ok(None) => {
                debug!(record = %snapshot.header(), "record dropped by processor");
                self.pipeline_listener.after_record_processing(&snapshot, None);
            }
            Err(e) => {
                error!(record = %snapshot.header(), "unable to process record: {e}");
                self.pipeline_listener
                    .on_record_processing_exception(&snapshot, &e);
                self.report.metrics.error_count += 1;
                self.report.last_error = Some(format!("{:#}", BatchError::Processing(e)));
                if self.parameters.strict_mode {
                    return Err(Termination::Aborted(
                        "processing error in strict mode".to_string(),
                    ));
                }
            }
        }
        self.check_error_threshold()
    }

    /// Threshold policy: checked once per record, after that record's
    /// accounting is complete.
    fn check_error_threshold(&mut self) -> Result<(), Termination> {
        if let Some(threshold) = self.parameters.error_threshold
            && self.report.metrics.error_count >= threshold
        {
            let e = BatchError::ErrorThresholdExceeded { threshold };
            self.report.last_error = Some(e.to_string());
            return Err(Termination::Aborted(e.to_string()));
        }
        Ok(())
    }

    fn write_batch(&mut self, batch: &Batch<O>) -> Result<(), Termination> {
        if batch.is_empty() {
            return Ok(());
        }
        debug!(records = batch.len(), "writing batch");
        self.writer_listener.before_record_writing(batch);
        match self.writer.write_records(batch) {
            Ok(()) => {
                self.writer_listener.after_record_writing(batch);
                self.batch_listener.after_batch_writing(batch);
                self.report.metrics.write_count += batch.len() as u64;
                Ok(())
            }
            Err(e) => {
                error!("unable to write records: {e}");
                self.writer_listener.on_record_writing_exception(batch, &e);
                self.batch_listener.on_batch_writing_exception(batch, &e);
                self.report.last_error = Some(format!("{:#}", BatchError::Write(e)));
                if self.parameters.continue_on_write_error {
                    self.report.metrics.error_count += batch.len() as u64;
                    self.check_error_threshold()
                } else {
                    Err(Termination::Failed(BatchError::Write(anyhow::anyhow!(
                        "batch of {} records rejected by writer",
                        batch.len()
                    ))))
                }
            }
        }
    }

    fn close_resources(&mut self) {
        debug!("closing record reader");
        if let Err(e) = self.reader.close() {
            error!("unable to close record reader: {e}");
        }
        debug!("closing record writer");
        if let Err(e) = self.writer.close() {
            error!("unable to close record writer: {e}");
        }
    }

    fn notify_monitor(&self) {
        if self.parameters.monitoring_enabled
            && let Some(monitor) = &self.monitor
        {
            monitor.on_job_update(&self.report);
        }
    }

    fn teardown(&mut self, status: JobStatus) {
        self.report.metrics.end_time = Some(SystemTime::now());
        self.set_status(status);
        info!(
            job = %self.parameters.name,
            status = %self.report.status,
            read = self.report.metrics.read_count,
            written = self.report.metrics.write_count,
            "job finished"
        );
        self.notify_monitor();
        self.job_listener.after_job(&self.report);
    }
}

impl<I: Payload, O: Payload> Job for BatchJob<I, O> {
    fn name(&self) -> &str {
        &self.parameters.name
    }

    fn execute(&mut self) -> JobReport {
        self.start();
        let outcome = self.run();
        if outcome.is_ok() {
            self.set_status(JobStatus::Stopping);
        }
        self.close_resources();
        match outcome {
            Ok(()) => self.teardown(JobStatus::Completed),
            Err(Termination::Aborted(reason)) => {
                info!(job = %self.parameters.name, reason, "job aborted");
                self.teardown(JobStatus::Aborted);
            }
            Err(Termination::Failed(e)) => {
                error!(job = %self.parameters.name, "job failed: {e}");
                if self.report.last_error.is_none() {
                    self.report.last_error = Some(format!("{e:#}"));
                }
                self.teardown(JobStatus::Failed);
            }
        }
        let mut report = JobReport::new(self.parameters.clone());
        std::mem::swap(&mut report, &mut self.report);
        // Leave a fresh report behind so a re-executed job starts clean.
        self.more_records = true;
        report
    }
}

impl<I: Payload, O: Payload> BatchJob<I, O> {
    /// Attach an opaque result value to the final report, visible to
    /// listeners and the report merger.
    pub fn set_result(&mut self, result: serde_json::Value) {
        self.report.result = Some(result);
    }
}
