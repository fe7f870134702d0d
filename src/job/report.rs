//! Job status and the final execution report.

use crate::job::{JobMetrics, JobParameters};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::UNIX_EPOCH;

/// Lifecycle status of a job.
///
/// `Completed`, `Aborted`, and `Failed` are terminal; the others are only
/// visible through monitoring snapshots taken mid-run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    /// The job is opening its reader and writer.
    Starting,
    /// The job is running its read-process-write loop.
    Started,
    /// The job left the loop and is closing resources.
    Stopping,
    /// The run finished normally (source exhausted).
    Completed,
    /// The run was cut short by an abort policy (threshold, strict mode,
    /// abort-on-first flags).
    Aborted,
    /// The run was killed by a fatal error (open, read, or unrecovered
    /// write failure).
    Failed,
}

impl JobStatus {
    /// Severity rank used when merging reports: Failed > Aborted >
    /// Completed; non-terminal states rank lowest.
    #[must_use]
    pub fn severity(self) -> u8 {
        match self {
            JobStatus::Failed => 3,
            JobStatus::Aborted => 2,
            JobStatus::Completed => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Starting => "starting",
            JobStatus::Started => "started",
            JobStatus::Stopping => "stopping",
            JobStatus::Completed => "completed",
            JobStatus::Aborted => "aborted",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Final status, metrics, and result of one job run.
///
/// Created when the job starts and finalized when it ends; after that it is
/// immutable — merging produces a new report rather than mutating inputs.
#[derive(Clone, Debug, Serialize)]
pub struct JobReport {
    /// Name of the job that produced this report.
    pub job_name: String,
    /// Configuration the job ran with.
    pub parameters: JobParameters,
    /// Execution counters and timestamps.
    pub metrics: JobMetrics,
    /// Current (or terminal) status.
    pub status: JobStatus,
    /// Opaque computed value attached by listeners or stages, if any.
    pub result: Option<Value>,
    /// Message of the last error encountered, if any.
    pub last_error: Option<String>,
    /// Description of the data source the job read from.
    pub data_source: String,
}

impl JobReport {
    /// Create a fresh report for a starting job.
    pub fn new(parameters: JobParameters) -> Self {
        Self {
            job_name: parameters.name.clone(),
            parameters,
            metrics: JobMetrics::new(),
            status: JobStatus::Starting,
            result: None,
            last_error: None,
            data_source: String::new(),
        }
    }
}

impl Default for JobReport {
    fn default() -> Self {
        Self::new(JobParameters::default())
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Job report: '{}'", self.job_name)?;
        writeln!(f, "  Status:      {}", self.status)?;
        writeln!(f, "  Data source: {}", self.data_source)?;
        if let Some(duration) = self.metrics.duration() {
            writeln!(f, "  Duration:    {duration:?}")?;
        } else if let Some(start) = self.metrics.start_time {
            // In-progress snapshot: show elapsed millis since epoch start.
            if let Ok(since) = start.duration_since(UNIX_EPOCH) {
                writeln!(f, "  Started at:  {}ms since epoch", since.as_millis())?;
            }
        }
        writeln!(f, "  Read:        {}", self.metrics.read_count)?;
        writeln!(f, "  Filtered:    {}", self.metrics.filter_count)?;
        writeln!(f, "  Skipped:     {}", self.metrics.skip_count)?;
        writeln!(f, "  Errors:      {}", self.metrics.error_count)?;
        writeln!(f, "  Written:     {}", self.metrics.write_count)?;
        for (name, value) in self.metrics.custom_metrics() {
            writeln!(f, "  {name}: {value}")?;
        }
        if let Some(error) = &self.last_error {
            writeln!(f, "  Last error:  {error}")?;
        }
        Ok(())
    }
}
