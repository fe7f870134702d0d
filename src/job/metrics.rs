//! Execution counters accumulated while a job runs.
//!
//! Metrics are mutated only by the thread driving their job, so no locking
//! is involved; cross-job visibility is guaranteed by the executor's join
//! barrier, not by the metrics themselves. Beyond the built-in counters, an
//! open map of named custom metrics is available to listeners and stages
//! (the engine itself records `mapping_errors` and `rejected_records`
//! there).

use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// Counters, timestamps, and custom metrics for one job run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct JobMetrics {
    /// Records successfully read.
    pub read_count: u64,
    /// Records dropped by the filter stage.
    pub filter_count: u64,
    /// Records that failed mapping, processing, or (when the job continues
    /// past write failures) writing.
    pub error_count: u64,
    /// Records successfully written.
    pub write_count: u64,
    /// Records skipped by validation rejections.
    pub skip_count: u64,
    /// Instant the job started.
    pub start_time: Option<SystemTime>,
    /// Instant the job finished.
    pub end_time: Option<SystemTime>,
    custom: BTreeMap<String, Value>,
}

impl JobMetrics {
    /// Fresh metrics with every counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wall-clock duration of the run, when both timestamps are set.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end.duration_since(start).ok(),
            _ => None,
        }
    }

    /// Set a named custom metric, replacing any previous value.
    pub fn set_metric(&mut self, name: impl Into<String>, value: Value) {
        self.custom.insert(name.into(), value);
    }

    /// Increment a named custom counter metric, creating it at `delta`.
    pub fn increment_metric(&mut self, name: &str, delta: u64) {
        let current = self
            .custom
            .get(name)
            .and_then(Value::as_u64)
            .unwrap_or(0);
        self.custom.insert(name.to_string(), json!(current + delta));
    }

    /// Read a named custom metric.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<&Value> {
        self.custom.get(name)
    }

    /// All custom metrics, ordered by name.
    #[must_use]
    pub fn custom_metrics(&self) -> &BTreeMap<String, Value> {
        &self.custom
    }
}
