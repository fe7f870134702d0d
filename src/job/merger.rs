//! Merge partial reports from concurrently executed jobs.

use crate::job::{JobParameters, JobReport, JobStatus};
use serde_json::Value;

/// Merge partial reports into one consolidated report.
///
/// Pure: inputs are not mutated. Associative and commutative over the
/// counter fields. Merge rules:
///
/// - counters (read, filter, error, write, skip) are summed;
/// - `start_time` is the minimum, `end_time` the maximum across inputs;
/// - `data_source` is the concatenation, one per line, in input order;
/// - `result`s are collected into an ordered JSON array, one entry per
///   input report that carried one, in input order;
/// - `status` is the most severe present: Failed > Aborted > Completed.
///
/// Merging an empty slice yields a default, completed report.
#[must_use]
pub fn merge_reports(reports: &[JobReport]) -> JobReport {
    let mut merged = JobReport::new(JobParameters::new("merged report"));
    merged.status = JobStatus::Completed;

    let mut results: Vec<Value> = Vec::new();
    let mut data_sources: Vec<&str> = Vec::new();

    for report in reports {
        merged.metrics.read_count += report.metrics.read_count;
        merged.metrics.filter_count += report.metrics.filter_count;
        merged.metrics.error_count += report.metrics.error_count;
        merged.metrics.write_count += report.metrics.write_count;
        merged.metrics.skip_count += report.metrics.skip_count;

        merged.metrics.start_time = match (merged.metrics.start_time, report.metrics.start_time) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        merged.metrics.end_time = match (merged.metrics.end_time, report.metrics.end_time) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        if report.status.severity() > merged.status.severity() {
            merged.status = report.status;
        }
        if let Some(result) = &report.result {
            results.push(result.clone());
        }
        if let Some(error) = &report.last_error {
            merged.last_error = Some(error.clone());
        }
        data_sources.push(&report.data_source);
    }

    merged.data_source = data_sources.join("\n");
    if !results.is_empty() {
        merged.result = Some(Value::Array(results));
    }
    merged
}
