use anyhow::anyhow;
use batchflow::reader::{RecordReader, RetryableRecordReader};
use batchflow::testing::{CountingRetryListener, FailingRecordReader, FlakyRecordReader};
use batchflow::*;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn zero_delay(attempts: usize) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::ZERO)
}

#[test]
fn succeeds_first_try_without_waiting() {
    let listener = Arc::new(CountingRetryListener::new());
    let mut template = RetryTemplate::new(zero_delay(3)).with_listener(listener.clone());

    let result: anyhow::Result<u32> = template.execute(|| Ok(7));

    assert_eq!(result.unwrap(), 7);
    assert_eq!(listener.before_calls.load(Ordering::SeqCst), 1);
    assert_eq!(listener.after_calls.load(Ordering::SeqCst), 1);
    assert_eq!(listener.exceptions.load(Ordering::SeqCst), 0);
    assert_eq!(listener.before_waits.load(Ordering::SeqCst), 0);
    assert_eq!(listener.max_attempts.load(Ordering::SeqCst), 0);
}

#[test]
fn exhausts_attempt_budget_and_reports_max_attempts() {
    let listener = Arc::new(CountingRetryListener::new());
    let mut template = RetryTemplate::new(zero_delay(3)).with_listener(listener.clone());

    let mut calls = 0;
    let result: anyhow::Result<u32> = template.execute(|| {
        calls += 1;
        Err(anyhow!("always down"))
    });

    assert!(result.is_err());
    assert_eq!(calls, 3);
    assert_eq!(listener.before_calls.load(Ordering::SeqCst), 3);
    assert_eq!(listener.exceptions.load(Ordering::SeqCst), 3);
    // No wait after the final failed attempt.
    assert_eq!(listener.before_waits.load(Ordering::SeqCst), 2);
    assert_eq!(listener.after_waits.load(Ordering::SeqCst), 2);
    assert_eq!(listener.max_attempts.load(Ordering::SeqCst), 1);
    assert_eq!(listener.after_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn recovers_before_the_budget_runs_out() {
    let listener = Arc::new(CountingRetryListener::new());
    let mut template = RetryTemplate::new(zero_delay(5)).with_listener(listener.clone());

    let mut calls = 0;
    let result: anyhow::Result<&str> = template.execute(|| {
        calls += 1;
        if calls < 3 {
            Err(anyhow!("transient"))
        } else {
            Ok("recovered")
        }
    });

    assert_eq!(result.unwrap(), "recovered");
    assert_eq!(calls, 3);
    assert_eq!(listener.exceptions.load(Ordering::SeqCst), 2);
    assert_eq!(listener.before_waits.load(Ordering::SeqCst), 2);
    assert_eq!(listener.after_waits.load(Ordering::SeqCst), 2);
    assert_eq!(listener.after_calls.load(Ordering::SeqCst), 1);
    assert_eq!(listener.max_attempts.load(Ordering::SeqCst), 0);
}

#[test]
fn retryable_reader_recovers_from_transient_failures() {
    let flaky = FlakyRecordReader::new(2, vec![10u32, 20]);
    let mut reader = RetryableRecordReader::new(flaky, zero_delay(3));

    let first = reader.read_record().unwrap().unwrap();
    assert_eq!(*first.payload(), 10);
    let second = reader.read_record().unwrap().unwrap();
    assert_eq!(*second.payload(), 20);
    assert!(reader.read_record().unwrap().is_none());
}

#[test]
fn retryable_reader_propagates_exhaustion_by_default() {
    let mut reader: RetryableRecordReader<_> =
        RetryableRecordReader::new(FailingRecordReader::new("dead source"), zero_delay(2));

    let result: anyhow::Result<Option<Record<u32>>> = reader.read_record();
    assert!(result.is_err());
}

#[test]
fn retryable_reader_can_map_exhaustion_to_end_of_stream() {
    let mut reader = RetryableRecordReader::new(FailingRecordReader::new("dead source"), zero_delay(2))
        .end_of_stream_on_exhaustion(true);

    let result: anyhow::Result<Option<Record<u32>>> = reader.read_record();
    assert!(result.unwrap().is_none());
}

#[test]
fn template_hooks_fire_through_the_reader_wrapper() {
    let listener = Arc::new(CountingRetryListener::new());
    let template = RetryTemplate::new(zero_delay(4)).with_listener(listener.clone());
    let mut reader = RetryableRecordReader::with_template(
        FlakyRecordReader::new(3, vec!["payload"]),
        template,
    );

    let record = reader.read_record().unwrap().unwrap();
    assert_eq!(*record.payload(), "payload");
    assert_eq!(listener.before_calls.load(Ordering::SeqCst), 4);
    assert_eq!(listener.exceptions.load(Ordering::SeqCst), 3);
    assert_eq!(listener.after_calls.load(Ordering::SeqCst), 1);
}

#[test]
#[should_panic(expected = "max attempts")]
fn zero_attempt_policy_is_rejected() {
    let _ = RetryPolicy::new(0, Duration::ZERO);
}
