//! Monitoring hook: periodic report snapshots for an injected observer.
//!
//! No process-wide registry: an observer is handed to the job at
//! construction and receives the in-progress [`JobReport`] after each batch
//! and once more at job end. Transport (console, JMX-like bridge, HTTP) is
//! the observer's business.

use crate::job::JobReport;
use tracing::info;

/// Receives in-progress report snapshots at defined points.
pub trait JobMonitor: Send + Sync {
    /// Called with the current report after each batch and at job end.
    fn on_job_update(&self, report: &JobReport);
}

/// A monitor that logs a one-line progress summary per snapshot.
pub struct LoggingJobMonitor;

impl JobMonitor for LoggingJobMonitor {
    fn on_job_update(&self, report: &JobReport) {
        info!(
            job = %report.job_name,
            status = %report.status,
            read = report.metrics.read_count,
            written = report.metrics.write_count,
            errors = report.metrics.error_count,
            "job progress"
        );
    }
}
