use anyhow::Error;
use batchflow::listener::{
    BatchListener, CompositeJobListener, CompositePipelineListener, JobListener, PipelineListener,
};
use batchflow::reader::IterableRecordReader;
use batchflow::testing::{EventLog, record_of};
use batchflow::writer::{CollectionRecordWriter, shared_collection};
use batchflow::*;
use std::sync::Arc;

struct NamedJobListener {
    name: &'static str,
    log: EventLog,
}

impl JobListener for NamedJobListener {
    fn before_job(&self, _parameters: &JobParameters) {
        self.log.push(format!("{}:before_job", self.name));
    }

    fn after_job(&self, _report: &JobReport) {
        self.log.push(format!("{}:after_job", self.name));
    }
}

#[test]
fn composite_fires_before_in_order_and_after_in_reverse() {
    let log = EventLog::new();
    let mut composite = CompositeJobListener::default();
    composite.add(Arc::new(NamedJobListener {
        name: "a",
        log: log.clone(),
    }));
    composite.add(Arc::new(NamedJobListener {
        name: "b",
        log: log.clone(),
    }));

    let parameters = JobParameters::new("ordering");
    composite.before_job(&parameters);
    composite.after_job(&JobReport::new(parameters));

    assert_eq!(
        log.snapshot(),
        vec!["a:before_job", "b:before_job", "b:after_job", "a:after_job"]
    );
}

#[test]
fn job_listeners_fire_around_execution() {
    let log = EventLog::new();
    let mut job = JobBuilder::new("observed")
        .reader(IterableRecordReader::new(vec![1u32]))
        .job_listener(Arc::new(NamedJobListener {
            name: "outer",
            log: log.clone(),
        }))
        .build();

    job.execute();

    assert_eq!(log.snapshot(), vec!["outer:before_job", "outer:after_job"]);
}

struct AddingPipelineListener(u32);

impl PipelineListener<u32, u32> for AddingPipelineListener {
    fn before_record_processing(&self, record: Record<u32>) -> Record<u32> {
        let delta = self.0;
        record.map_payload(|x| x + delta)
    }
}

#[test]
fn before_record_processing_threads_through_delegates() {
    let mut composite = CompositePipelineListener::<u32, u32>::default();
    composite.add(Arc::new(AddingPipelineListener(1)));
    composite.add(Arc::new(AddingPipelineListener(10)));

    let transformed = composite.before_record_processing(record_of(5u32));
    assert_eq!(*transformed.payload(), 16);
}

#[test]
fn pipeline_listener_transforms_records_before_the_stages() {
    let sink = shared_collection();
    let mut job = JobBuilder::new("preprocess")
        .reader(IterableRecordReader::new(vec![1u32, 2, 3]))
        .pipeline_listener(Arc::new(AddingPipelineListener(100)))
        .writer(CollectionRecordWriter::new(sink.clone()))
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(*sink.lock().unwrap(), vec![101, 102, 103]);
}

struct LoggingBatchListener {
    log: EventLog,
}

impl BatchListener<u32> for LoggingBatchListener {
    fn before_batch_reading(&self) {
        self.log.push("before_batch_reading");
    }

    fn after_batch_processing(&self, batch: &Batch<u32>) {
        self.log.push(format!("after_batch_processing:{}", batch.len()));
    }

    fn after_batch_writing(&self, batch: &Batch<u32>) {
        self.log.push(format!("after_batch_writing:{}", batch.len()));
    }

    fn on_batch_writing_exception(&self, _batch: &Batch<u32>, _error: &Error) {
        self.log.push("on_batch_writing_exception");
    }
}

#[test]
fn batch_listener_sees_every_batch_boundary() {
    let log = EventLog::new();
    let mut job = JobBuilder::new("batch-events")
        .reader(IterableRecordReader::new(vec![1u32, 2, 3]))
        .batch_size(2)
        .batch_listener(Arc::new(LoggingBatchListener { log: log.clone() }))
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Completed);
    // Second cycle reads the tail record and detects end-of-stream.
    assert_eq!(
        log.snapshot(),
        vec![
            "before_batch_reading",
            "after_batch_processing:2",
            "after_batch_writing:2",
            "before_batch_reading",
            "after_batch_processing:1",
            "after_batch_writing:1",
        ]
    );
}

struct LoggingPipelineObserver {
    log: EventLog,
}

impl PipelineListener<u32, u32> for LoggingPipelineObserver {
    fn after_record_processing(&self, record: &Record<u32>, processed: Option<&Record<u32>>) {
        self.log.push(format!(
            "after:{}:{}",
            record.payload(),
            processed.map_or("dropped".to_string(), |r| r.payload().to_string())
        ));
    }

    fn on_record_processing_exception(&self, record: &Record<u32>, _error: &Error) {
        self.log.push(format!("error:{}", record.payload()));
    }
}

#[test]
fn pipeline_observer_distinguishes_outcomes() {
    let log = EventLog::new();
    let mut job = JobBuilder::new("outcomes")
        .reader(IterableRecordReader::new(vec![1u32, 2, 3]))
        .processor(|r: Record<u32>| match *r.payload() {
            2 => Ok(None),
            3 => Err(anyhow::anyhow!("bad")),
            _ => Ok(Some(r)),
        })
        .pipeline_listener(Arc::new(LoggingPipelineObserver { log: log.clone() }))
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.metrics.error_count, 1);
    assert_eq!(log.snapshot(), vec!["after:1:1", "after:2:dropped", "error:3"]);
}
