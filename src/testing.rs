//! Testing utilities for batchflow pipelines.
//!
//! Helpers for writing idiomatic tests against the engine: record builders,
//! misbehaving readers with scripted failures, a hook-counting retry
//! listener, and an event log for asserting listener ordering. These are
//! used by the crate's own test suite and exported for end users testing
//! their stages.
//!
//! ```
//! use batchflow::testing::records_of;
//!
//! let records = records_of(vec!["a", "b"]);
//! assert_eq!(records[1].header().number(), 2);
//! ```

use crate::reader::{IterableRecordReader, RecordReader};
use crate::record::{Header, Payload, Record};
use crate::retry::RetryListener;
use anyhow::{Error, Result, anyhow};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Source label used by test record builders.
pub const TEST_SOURCE: &str = "test data";

/// Build records from payloads with sequential headers starting at 1.
pub fn records_of<P: Payload>(payloads: Vec<P>) -> Vec<Record<P>> {
    payloads
        .into_iter()
        .enumerate()
        .map(|(i, p)| Record::new(Header::new(i as u64 + 1, TEST_SOURCE), p))
        .collect()
}

/// Build a single record numbered 1.
pub fn record_of<P: Payload>(payload: P) -> Record<P> {
    Record::new(Header::new(1, TEST_SOURCE), payload)
}

/// A reader whose every read fails. Drives fatal-read paths.
pub struct FailingRecordReader {
    message: String,
}

impl FailingRecordReader {
    /// Create a reader failing with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<P> RecordReader<P> for FailingRecordReader {
    fn read_record(&mut self) -> Result<Option<Record<P>>> {
        Err(anyhow!("{}", self.message))
    }

    fn data_source(&self) -> String {
        "always-failing source".to_string()
    }
}

/// A reader that fails a scripted number of reads up front, then yields the
/// given payloads. Drives retry-wrapper paths.
pub struct FlakyRecordReader<P> {
    failures_left: usize,
    delegate: IterableRecordReader<P>,
}

impl<P> FlakyRecordReader<P> {
    /// Create a reader failing its first `failures` reads.
    pub fn new(failures: usize, payloads: Vec<P>) -> Self {
        Self {
            failures_left: failures,
            delegate: IterableRecordReader::new(payloads),
        }
    }
}

impl<P: Payload> RecordReader<P> for FlakyRecordReader<P> {
    fn read_record(&mut self) -> Result<Option<Record<P>>> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(anyhow!("transient read failure"));
        }
        self.delegate.read_record()
    }

    fn data_source(&self) -> String {
        "flaky source".to_string()
    }
}

/// Counts every retry hook invocation.
#[derive(Default)]
pub struct CountingRetryListener {
    /// `before_call` invocations.
    pub before_calls: AtomicUsize,
    /// `after_call` invocations.
    pub after_calls: AtomicUsize,
    /// `on_exception` invocations.
    pub exceptions: AtomicUsize,
    /// `before_wait` invocations.
    pub before_waits: AtomicUsize,
    /// `after_wait` invocations.
    pub after_waits: AtomicUsize,
    /// `on_max_attempts` invocations.
    pub max_attempts: AtomicUsize,
}

impl CountingRetryListener {
    /// Fresh listener with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RetryListener for CountingRetryListener {
    fn before_call(&self) {
        self.before_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn after_call(&self) {
        self.after_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exception(&self, _error: &Error, _attempt: usize) {
        self.exceptions.fetch_add(1, Ordering::SeqCst);
    }

    fn before_wait(&self, _attempt: usize) {
        self.before_waits.fetch_add(1, Ordering::SeqCst);
    }

    fn after_wait(&self, _attempt: usize) {
        self.after_waits.fetch_add(1, Ordering::SeqCst);
    }

    fn on_max_attempts(&self, _error: &Error) {
        self.max_attempts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Shared, ordered log of named events; asserts listener invocation order.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    /// Fresh, empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event name.
    pub fn push(&self, event: impl Into<String>) {
        self.events
            .lock()
            .expect("event log lock")
            .push(event.into());
    }

    /// Snapshot the events recorded so far, in order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.events.lock().expect("event log lock").clone()
    }
}
