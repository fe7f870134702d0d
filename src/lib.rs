//! # Batchflow
//!
//! A **batch record-processing engine** for Rust: read records from a data
//! source, run them through a configurable pipeline
//! (filter → map → validate → process → write), track execution metrics,
//! and partition work across concurrent jobs connected by queues.
//!
//! ## Key Features
//!
//! - **Pluggable stages** - readers, filters, mappers, validators,
//!   processors, and writers are small traits you implement with your
//!   business logic; the engine owns iteration, error accounting, and
//!   termination
//! - **Explicit error policy** - skip, reject, or abort per record, with an
//!   optional error threshold and strict mode
//! - **Batched writing** - records accumulate into batches of a configured
//!   size before reaching the writer
//! - **Lifecycle listeners** - observers at job, batch, pipeline, reader,
//!   and writer granularity, composed in decorator order
//! - **Retryable I/O** - a generic retry template with backoff and hooks,
//!   plus reader/writer decorators built on it
//! - **Parallel jobs** - a worker-pool executor runs independent jobs
//!   concurrently; dispatchers fan records out to consumer queues and a
//!   poison record terminates every consumer
//! - **Reports** - every run produces a [`JobReport`] with status and
//!   metrics; partial reports from parallel jobs merge into one
//!
//! ## Quick Start
//!
//! ```
//! use batchflow::*;
//!
//! let sink = writer::shared_collection();
//! let mut job = JobBuilder::new("double-evens")
//!     .reader(reader::IterableRecordReader::new(vec![1u32, 2, 3, 4]))
//!     .filter(|r: &Record<u32>| r.payload() % 2 != 0)
//!     .processor(|r: Record<u32>| Ok(Some(r.map_payload(|x| x * 2))))
//!     .writer(writer::CollectionRecordWriter::new(sink.clone()))
//!     .batch_size(2)
//!     .build();
//!
//! let report = job.execute();
//! assert_eq!(report.status, JobStatus::Completed);
//! assert_eq!(*sink.lock().unwrap(), vec![4, 8]);
//! ```
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Record`] is one unit of input plus its [`Header`] (sequence number,
//! source, creation time). Readers assign 1-based, strictly increasing
//! numbers. A [`Batch`] is an ordered group of records written together.
//! The poison record (header number 0) signals end-of-stream to queue
//! consumers and is never filtered, mapped, or validated.
//!
//! ### The pipeline
//!
//! Each record read makes one pass through the stages:
//!
//! 1. **Filter** - predicates in registration order; first match drops the
//!    record and counts it as filtered
//! 2. **Map** - convert the payload to a domain type; the only stage where
//!    the payload type may change
//! 3. **Validate** - domain rules; a rejection counts as a skip
//! 4. **Process** - ordered business-logic chain; a stage returning
//!    `Ok(None)` drops the record silently
//! 5. **Write** - survivors accumulate to the configured batch size, then
//!    go to the writer as one [`Batch`]
//!
//! Errors are data: nothing escapes [`Job::execute`]; the final
//! [`JobReport`] carries status, counters, and the last error.
//!
//! ### Parallel topologies
//!
//! One job is strictly sequential. To parallelize, run several jobs on a
//! [`JobExecutor`] and connect them with [`dispatcher`] queues: a producer
//! job writes to a dispatcher (broadcast, round-robin, random, or
//! content-based) and consumer jobs read from their queues through
//! [`reader::QueueRecordReader`]. Broadcasting a poison record terminates
//! every consumer. Join the handles, then consolidate with
//! [`merge_reports`].
//!
//! ## Module Overview
//!
//! - [`record`] - headers, records, batches, the poison sentinel
//! - [`reader`] / [`writer`] - input and output traits plus in-memory,
//!   queue, and retryable implementations
//! - [`filter`] / [`mapper`] / [`validator`] / [`processor`] - the stage
//!   traits
//! - [`listener`] - lifecycle observers and their ordered composites
//! - [`retry`] - retry policy, template, and hooks
//! - [`dispatcher`] - queue plumbing and dispatching strategies
//! - [`job`] - builder, engine, executor, monitoring, reports, merging
//! - [`testing`] - builders and misbehaving components for tests

pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod job;
pub mod listener;
pub mod mapper;
pub mod processor;
pub mod reader;
pub mod record;
pub mod retry;
pub mod testing;
pub mod validator;
pub mod writer;

// General re-exports
pub use error::BatchError;
pub use job::{
    BatchJob, Job, JobBuilder, JobExecutor, JobHandle, JobMetrics, JobMonitor, JobParameters,
    JobReport, JobStatus, merge_reports,
};
pub use record::{Batch, Header, MultiRecord, Payload, Record};
pub use retry::{RetryListener, RetryPolicy, RetryTemplate};
