use anyhow::anyhow;
use batchflow::mapper::FieldMap;
use batchflow::reader::{IterableMultiRecordReader, IterableRecordReader, RecordReader};
use batchflow::testing::FailingRecordReader;
use batchflow::validator::ValidationError;
use batchflow::writer::{CollectionRecordWriter, RecordWriter, shared_collection};
use batchflow::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[test]
fn empty_reader_completes_without_writing() {
    let sink = shared_collection::<u32>();
    let mut job = JobBuilder::new("empty")
        .reader(IterableRecordReader::new(Vec::<u32>::new()))
        .writer(CollectionRecordWriter::new(sink.clone()))
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.metrics.read_count, 0);
    assert_eq!(report.metrics.write_count, 0);
    assert!(sink.lock().unwrap().is_empty());
}

#[test]
fn batch_size_slices_writes_in_order() {
    // 7 valid records with batch size 3 must produce batches of 3, 3, 1.
    struct BatchSizeRecorder(Arc<Mutex<Vec<usize>>>);

    impl RecordWriter<u32> for BatchSizeRecorder {
        fn write_records(&mut self, batch: &Batch<u32>) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(batch.len());
            Ok(())
        }
    }

    let sizes = Arc::new(Mutex::new(Vec::new()));
    let mut job = JobBuilder::new("batching")
        .reader(IterableRecordReader::new((1u32..=7).collect::<Vec<_>>()))
        .writer(BatchSizeRecorder(sizes.clone()))
        .batch_size(3)
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(*sizes.lock().unwrap(), vec![3, 3, 1]);
    assert_eq!(report.metrics.read_count, 7);
    assert_eq!(report.metrics.write_count, 7);
}

#[test]
fn error_threshold_aborts_after_exact_count() {
    // 5 records that each fail processing with a threshold of 2: the run
    // stops after exactly 2 failures.
    let mut job = JobBuilder::new("threshold")
        .reader(IterableRecordReader::new(vec![1u32, 2, 3, 4, 5]))
        .processor(|_r: Record<u32>| -> anyhow::Result<Option<Record<u32>>> {
            Err(anyhow!("boom"))
        })
        .error_threshold(2)
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Aborted);
    assert_eq!(report.metrics.error_count, 2);
    assert_eq!(report.metrics.read_count, 2);
    assert!(report.last_error.unwrap().contains("threshold"));
}

#[test]
fn strict_mode_aborts_on_first_processing_error() {
    let mut job = JobBuilder::new("strict")
        .reader(IterableRecordReader::new(vec![1u32, 2, 3]))
        .processor(|r: Record<u32>| {
            if *r.payload() == 2 {
                Err(anyhow!("bad record"))
            } else {
                Ok(Some(r))
            }
        })
        .strict_mode(true)
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Aborted);
    assert_eq!(report.metrics.error_count, 1);
    assert_eq!(report.metrics.read_count, 2);
}

#[test]
fn filters_run_in_order_and_short_circuit() {
    let sink = shared_collection();
    let mut job = JobBuilder::new("filters")
        .reader(IterableRecordReader::new(vec![1u32, 2, 3, 4, 5, 6]))
        .filter(|r: &Record<u32>| r.payload() % 2 == 0)
        .filter(|r: &Record<u32>| *r.payload() == 3)
        .writer(CollectionRecordWriter::new(sink.clone()))
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.metrics.filter_count, 4);
    assert_eq!(*sink.lock().unwrap(), vec![1, 5]);
}

#[test]
fn processor_chain_feeds_each_stage_and_none_drops_silently() {
    let sink = shared_collection();
    let mut job = JobBuilder::new("chain")
        .reader(IterableRecordReader::new(vec![1u32, 2, 3]))
        .processor(|r: Record<u32>| Ok(Some(r.map_payload(|x| x + 10))))
        .processor(|r: Record<u32>| {
            // Drop one record mid-chain; no error accounting.
            if *r.payload() == 12 {
                Ok(None)
            } else {
                Ok(Some(r))
            }
        })
        .processor(|r: Record<u32>| Ok(Some(r.map_payload(|x| x * 2))))
        .writer(CollectionRecordWriter::new(sink.clone()))
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(*sink.lock().unwrap(), vec![22, 26]);
    assert_eq!(report.metrics.error_count, 0);
    assert_eq!(report.metrics.write_count, 2);
}

#[test]
fn validation_rejection_skips_record() {
    let sink = shared_collection();
    let mut job = JobBuilder::new("validation")
        .reader(IterableRecordReader::new(vec![1u32, 2, 3, 4]))
        .validator(|r: &Record<u32>| {
            if r.payload() % 2 == 0 {
                Err(ValidationError::new("even numbers are not welcome"))
            } else {
                Ok(())
            }
        })
        .writer(CollectionRecordWriter::new(sink.clone()))
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.metrics.skip_count, 2);
    assert_eq!(report.metrics.error_count, 0);
    assert_eq!(report.metrics.metric("rejected_records"), Some(&json!(2)));
    assert_eq!(*sink.lock().unwrap(), vec![1, 3]);
}

#[test]
fn abort_on_first_reject_stops_the_run() {
    let mut job = JobBuilder::new("reject-abort")
        .reader(IterableRecordReader::new(vec![1u32, 2, 3]))
        .validator(|r: &Record<u32>| {
            if *r.payload() == 2 {
                Err(ValidationError::field("value", "must not be 2"))
            } else {
                Ok(())
            }
        })
        .abort_on_first_reject(true)
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Aborted);
    assert_eq!(report.metrics.skip_count, 1);
    assert_eq!(report.metrics.read_count, 2);
}

#[test]
fn mapping_error_skips_unless_configured_to_abort() {
    let mapper = |r: Record<String>| -> anyhow::Result<Record<u32>> {
        let parsed = r.payload().parse::<u32>()?;
        Ok(r.map_payload(|_| parsed))
    };

    let sink = shared_collection();
    let mut lenient = JobBuilder::with_mapper("lenient", mapper)
        .reader(IterableRecordReader::new(vec![
            "1".to_string(),
            "oops".to_string(),
            "3".to_string(),
        ]))
        .writer(CollectionRecordWriter::new(sink.clone()))
        .build();

    let report = lenient.execute();
    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.metrics.error_count, 1);
    assert_eq!(report.metrics.metric("mapping_errors"), Some(&json!(1)));
    assert_eq!(*sink.lock().unwrap(), vec![1, 3]);

    let mut aborting = JobBuilder::with_mapper("aborting", mapper)
        .reader(IterableRecordReader::new(vec![
            "1".to_string(),
            "oops".to_string(),
            "3".to_string(),
        ]))
        .abort_on_first_mapping_error(true)
        .build();

    let report = aborting.execute();
    assert_eq!(report.status, JobStatus::Aborted);
    assert_eq!(report.metrics.error_count, 1);
    assert_eq!(report.metrics.read_count, 2);
}

#[test]
fn fatal_read_fails_the_job() {
    let mut job = JobBuilder::<u32, u32>::new("fatal-read")
        .reader(FailingRecordReader::new("disk on fire"))
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Failed);
    assert_eq!(report.metrics.read_count, 0);
    assert!(report.last_error.unwrap().contains("disk on fire"));
}

#[test]
fn write_failure_fails_the_job_by_default() {
    struct RefusingWriter;

    impl RecordWriter<u32> for RefusingWriter {
        fn write_records(&mut self, _batch: &Batch<u32>) -> anyhow::Result<()> {
            Err(anyhow!("sink unavailable"))
        }
    }

    let mut job = JobBuilder::new("write-failure")
        .reader(IterableRecordReader::new(vec![1u32, 2]))
        .writer(RefusingWriter)
        .batch_size(2)
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Failed);
    assert_eq!(report.metrics.write_count, 0);
}

#[test]
fn write_failure_counts_batch_as_errors_when_continuing() {
    struct FlakySink {
        failures_left: usize,
        written: Arc<Mutex<Vec<u32>>>,
    }

    impl RecordWriter<u32> for FlakySink {
        fn write_records(&mut self, batch: &Batch<u32>) -> anyhow::Result<()> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(anyhow!("transient sink failure"));
            }
            let mut written = self.written.lock().unwrap();
            for record in batch {
                written.push(*record.payload());
            }
            Ok(())
        }
    }

    let written = Arc::new(Mutex::new(Vec::new()));
    let mut job = JobBuilder::new("write-continue")
        .reader(IterableRecordReader::new(vec![1u32, 2, 3, 4]))
        .writer(FlakySink {
            failures_left: 1,
            written: written.clone(),
        })
        .batch_size(2)
        .continue_on_write_error(true)
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.metrics.error_count, 2);
    assert_eq!(report.metrics.write_count, 2);
    assert_eq!(*written.lock().unwrap(), vec![3, 4]);
}

#[test]
fn headers_are_one_based_and_increasing() {
    let mut reader = IterableRecordReader::new(vec!["a", "b", "c"]);
    let mut numbers = Vec::new();
    while let Some(record) = reader.read_record().unwrap() {
        numbers.push(record.header().number());
    }
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn multi_record_reader_chunks_with_smaller_tail() {
    let mut reader = IterableMultiRecordReader::new((1u32..=7).collect::<Vec<_>>(), 3);
    let mut chunks = Vec::new();
    while let Some(multi) = reader.read_record().unwrap() {
        chunks.push(multi.into_payload().len());
    }
    assert_eq!(chunks, vec![3, 3, 1]);
}

#[test]
fn field_map_mapper_builds_json_records() {
    let mapper = FieldMap::new()
        .field("id", "user_id", |raw| Ok(raw.parse::<u64>()?.into()))
        .text("name", "display_name")
        .into_mapper()
        .unwrap();

    let rows = vec![
        HashMap::from([
            ("id".to_string(), "7".to_string()),
            ("name".to_string(), "ada".to_string()),
        ]),
        HashMap::from([("name".to_string(), "broken row".to_string())]),
    ];

    let sink = shared_collection();
    let mut job = JobBuilder::with_mapper("field-map", mapper)
        .reader(IterableRecordReader::new(rows))
        .writer(CollectionRecordWriter::new(sink.clone()))
        .build();

    let report = job.execute();

    assert_eq!(report.status, JobStatus::Completed);
    // The second row is missing "id": a mapping error, skipped.
    assert_eq!(report.metrics.error_count, 1);
    assert_eq!(
        *sink.lock().unwrap(),
        vec![json!({"user_id": 7, "display_name": "ada"})]
    );
}

#[test]
fn field_map_rejects_duplicate_targets_at_build_time() {
    let result = FieldMap::new()
        .text("a", "same")
        .text("b", "same")
        .into_mapper();
    assert!(result.is_err());
}

#[test]
fn poison_record_is_detected_by_header() {
    let poison = Record::<u32>::poison();
    assert!(poison.is_poison());
    assert_eq!(poison.header().number(), 0);

    let regular = batchflow::testing::record_of(5u32);
    assert!(!regular.is_poison());
}
