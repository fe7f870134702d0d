//! Concurrent job execution over a bounded worker pool.
//!
//! The [`JobExecutor`] runs jobs on a fixed-size rayon pool. Each submitted
//! job yields a [`JobHandle`]; joining a handle is the only cross-job
//! synchronization point, and the happens-before edge it provides is what
//! makes a worker job's final report safely readable by the merger.
//!
//! # Example
//!
//! ```no_run
//! use batchflow::job::{JobBuilder, JobExecutor, merge_reports};
//! use batchflow::reader::IterableRecordReader;
//!
//! # fn main() -> anyhow::Result<()> {
//! let executor = JobExecutor::new()?;
//! let handles = executor.submit_all(vec![
//!     Box::new(JobBuilder::<u32, u32>::new("a").reader(IterableRecordReader::new(vec![1])).build()) as _,
//!     Box::new(JobBuilder::<u32, u32>::new("b").reader(IterableRecordReader::new(vec![2])).build()) as _,
//! ]);
//! let reports = handles
//!     .into_iter()
//!     .map(|h| h.join())
//!     .collect::<anyhow::Result<Vec<_>>>()?;
//! let merged = merge_reports(&reports);
//! executor.shutdown();
//! # let _ = merged;
//! # Ok(())
//! # }
//! ```

use crate::job::{Job, JobReport};
use anyhow::{Context, Result};
use std::sync::mpsc::{Receiver, channel};
use tracing::debug;

/// Handle to a submitted job; joins the job's final report.
pub struct JobHandle {
    name: String,
    rx: Receiver<JobReport>,
}

impl JobHandle {
    /// Name of the job this handle tracks.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until the job finishes and return its report.
    ///
    /// # Errors
    ///
    /// Fails only if the job's worker died without producing a report
    /// (e.g. a panic inside user-supplied stage code).
    pub fn join(self) -> Result<JobReport> {
        self.rx
            .recv()
            .with_context(|| format!("job '{}' terminated without a report", self.name))
    }
}

/// Executes jobs on a bounded worker pool.
///
/// Executors should be explicitly shut down with
/// [`shutdown`](JobExecutor::shutdown), which waits for in-flight jobs
/// before releasing pool threads.
pub struct JobExecutor {
    pool: rayon::ThreadPool,
}

impl JobExecutor {
    /// Create an executor with one worker per available CPU.
    ///
    /// # Errors
    ///
    /// Fails if the thread pool cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_workers(num_cpus::get().max(1))
    }

    /// Create an executor with exactly `workers` worker threads.
    ///
    /// # Errors
    ///
    /// Fails if the thread pool cannot be built.
    pub fn with_workers(workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("batchflow-worker-{i}"))
            .build()
            .context("unable to build job executor pool")?;
        Ok(Self { pool })
    }

    /// Submit a job for asynchronous execution.
    pub fn submit(&self, mut job: Box<dyn Job>) -> JobHandle {
        let name = job.name().to_string();
        debug!(job = %name, "submitting job");
        let (tx, rx) = channel();
        self.pool.spawn(move || {
            let report = job.execute();
            // A dropped handle is fine; the send just goes nowhere.
            let _ = tx.send(report);
        });
        JobHandle { name, rx }
    }

    /// Submit several jobs; the returned handles preserve input order even
    /// though completion order may differ.
    pub fn submit_all(&self, jobs: Vec<Box<dyn Job>>) -> Vec<JobHandle> {
        jobs.into_iter().map(|job| self.submit(job)).collect()
    }

    /// Execute one job synchronously and return its report.
    ///
    /// # Errors
    ///
    /// Fails if the job's worker died without producing a report.
    pub fn execute(&self, job: Box<dyn Job>) -> Result<JobReport> {
        self.submit(job).join()
    }

    /// Submit all jobs, wait for every one, and return the reports in
    /// submission order.
    ///
    /// # Errors
    ///
    /// Fails if any job's worker died without producing a report.
    pub fn execute_all(&self, jobs: Vec<Box<dyn Job>>) -> Result<Vec<JobReport>> {
        self.submit_all(jobs)
            .into_iter()
            .map(JobHandle::join)
            .collect()
    }

    /// Shut the executor down, waiting for in-flight jobs to finish.
    ///
    /// Dropping the pool joins its worker threads after they drain any
    /// spawned work, so no submitted job is discarded silently.
    pub fn shutdown(self) {
        debug!("shutting down job executor");
        drop(self.pool);
    }
}
