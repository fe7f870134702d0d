//! Job construction, execution, monitoring, and reporting.
//!
//! A [`BatchJob`] owns one pass of the read-process-write loop; build it
//! with [`JobBuilder`], run it directly through the [`Job`] trait or hand
//! it to a [`JobExecutor`] to run several jobs in parallel, then combine
//! their reports with [`merge_reports`].

mod batch_job;
mod builder;
mod executor;
mod merger;
mod metrics;
mod monitor;
mod parameters;
mod report;

pub use batch_job::{BatchJob, Job};
pub use builder::JobBuilder;
pub use executor::{JobExecutor, JobHandle};
pub use merger::merge_reports;
pub use metrics::JobMetrics;
pub use monitor::{JobMonitor, LoggingJobMonitor};
pub use parameters::JobParameters;
pub use report::{JobReport, JobStatus};
