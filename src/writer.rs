//! Record writers: the output side of a batch job.
//!
//! A [`RecordWriter`] receives whole [`Batch`]es; the engine accumulates
//! processed records up to the configured batch size before invoking it.
//! A write failure is fatal for that batch — whether it fails the whole job
//! or only that batch is job configuration.

use crate::dispatcher::QueueSender;
use crate::record::{Batch, Payload};
use crate::retry::{RetryPolicy, RetryTemplate};
use anyhow::Result;
use std::fmt::Display;
use std::sync::{Arc, Mutex};

/// Writes batches of records to a data sink.
pub trait RecordWriter<P>: Send {
    /// Open the sink. Called once before the first write.
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Write one batch. The batch is never empty.
    fn write_records(&mut self, batch: &Batch<P>) -> Result<()>;

    /// Close the sink. Best-effort: the engine logs failures here instead of
    /// propagating them.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A writer that discards every batch. Default for jobs built without one.
pub struct NoOpRecordWriter;

impl<P> RecordWriter<P> for NoOpRecordWriter {
    fn write_records(&mut self, _batch: &Batch<P>) -> Result<()> {
        Ok(())
    }
}

/// Appends written payloads to a shared in-memory vector.
///
/// The vector is shared through `Arc<Mutex<…>>` so tests and callers can
/// inspect it after the job finishes.
pub struct CollectionRecordWriter<P> {
    items: Arc<Mutex<Vec<P>>>,
}

impl<P> CollectionRecordWriter<P> {
    /// Create a writer appending to `items`.
    pub fn new(items: Arc<Mutex<Vec<P>>>) -> Self {
        Self { items }
    }
}

impl<P: Payload> RecordWriter<P> for CollectionRecordWriter<P> {
    fn write_records(&mut self, batch: &Batch<P>) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| anyhow::anyhow!("collection writer target is poisoned"))?;
        for record in batch {
            items.push(record.payload().clone());
        }
        Ok(())
    }
}

/// Forwards written records to a dispatcher queue, one send per record.
///
/// Used on the producer side of a fan-out topology when the producing job's
/// output feeds downstream consumer jobs.
pub struct QueueRecordWriter<P> {
    sender: QueueSender<P>,
}

impl<P> QueueRecordWriter<P> {
    /// Create a writer forwarding to `sender`.
    pub fn new(sender: QueueSender<P>) -> Self {
        Self { sender }
    }
}

impl<P: Payload> RecordWriter<P> for QueueRecordWriter<P> {
    fn write_records(&mut self, batch: &Batch<P>) -> Result<()> {
        for record in batch {
            self.sender
                .send(record.clone())
                .map_err(|e| anyhow::anyhow!("{e}"))?;
        }
        Ok(())
    }
}

/// Writes one record payload per line to standard output.
pub struct StandardOutputRecordWriter;

impl<P: Payload + Display> RecordWriter<P> for StandardOutputRecordWriter {
    fn write_records(&mut self, batch: &Batch<P>) -> Result<()> {
        for record in batch {
            println!("{}", record.payload());
        }
        Ok(())
    }
}

/// Decorator that retries a delegate writer's `write_records` on failure.
///
/// Unlike the read side, an exhausted retry budget always propagates the
/// last error: silently dropping a batch is never acceptable write
/// semantics.
pub struct RetryableRecordWriter<W> {
    delegate: W,
    template: RetryTemplate,
}

impl<W> RetryableRecordWriter<W> {
    /// Wrap `delegate`, retrying writes per `policy`.
    pub fn new(delegate: W, policy: RetryPolicy) -> Self {
        Self {
            delegate,
            template: RetryTemplate::new(policy),
        }
    }

    /// Wrap `delegate` with a pre-built template (e.g. to attach hooks).
    pub fn with_template(delegate: W, template: RetryTemplate) -> Self {
        Self { delegate, template }
    }
}

impl<P, W: RecordWriter<P>> RecordWriter<P> for RetryableRecordWriter<W> {
    fn open(&mut self) -> Result<()> {
        self.delegate.open()
    }

    fn write_records(&mut self, batch: &Batch<P>) -> Result<()> {
        let delegate = &mut self.delegate;
        self.template.execute(|| delegate.write_records(batch))
    }

    fn close(&mut self) -> Result<()> {
        self.delegate.close()
    }
}

/// Convenience constructor for the shared vector used by
/// [`CollectionRecordWriter`].
#[must_use]
pub fn shared_collection<P>() -> Arc<Mutex<Vec<P>>> {
    Arc::new(Mutex::new(Vec::new()))
}
