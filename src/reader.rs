//! Record readers: the input side of a batch job.
//!
//! A [`RecordReader`] produces records one at a time; `Ok(None)` means the
//! data source is exhausted and ends the job loop normally. A read error is
//! fatal for the job — retry, when desired, is the reader's own concern via
//! [`RetryableRecordReader`].
//!
//! In-memory and queue-backed readers are provided here; anything touching
//! files, databases, or message brokers lives outside the engine and plugs
//! in through the same trait.
//!
//! # Example
//!
//! ```
//! use batchflow::reader::{IterableRecordReader, RecordReader};
//!
//! let mut reader = IterableRecordReader::new(vec!["a", "b"]);
//! reader.open().unwrap();
//! let first = reader.read_record().unwrap().unwrap();
//! assert_eq!(first.header().number(), 1);
//! assert_eq!(*first.payload(), "a");
//! ```

use crate::dispatcher::QueueReceiver;
use crate::record::{Header, MultiRecord, Payload, Record};
use crate::retry::{RetryPolicy, RetryTemplate};
use anyhow::Result;
use std::time::Duration;
use tracing::debug;

/// Reads records from a data source.
///
/// Implementations assign 1-based, strictly increasing header numbers for
/// the lifetime of the reader.
pub trait RecordReader<P>: Send {
    /// Open the data source. Called once before the first read.
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Read the next record. `Ok(None)` means end-of-stream, not an error.
    fn read_record(&mut self) -> Result<Option<Record<P>>>;

    /// Close the data source. Best-effort: the engine logs failures here
    /// instead of propagating them.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Human-readable description of the data source, used in job reports.
    fn data_source(&self) -> String {
        "unknown data source".to_string()
    }
}

/// A reader that never yields a record. Default for jobs built without one.
pub struct NoOpRecordReader;

impl<P> RecordReader<P> for NoOpRecordReader {
    fn read_record(&mut self) -> Result<Option<Record<P>>> {
        Ok(None)
    }

    fn data_source(&self) -> String {
        "no data source".to_string()
    }
}

/// Reads records from an in-memory collection of payloads.
pub struct IterableRecordReader<P> {
    items: std::vec::IntoIter<P>,
    total: usize,
    current: u64,
}

impl<P> IterableRecordReader<P> {
    /// Create a reader over `items`, emitted in order.
    pub fn new(items: Vec<P>) -> Self {
        let total = items.len();
        Self {
            items: items.into_iter(),
            total,
            current: 0,
        }
    }
}

impl<P: Payload> RecordReader<P> for IterableRecordReader<P> {
    fn read_record(&mut self) -> Result<Option<Record<P>>> {
        match self.items.next() {
            Some(payload) => {
                self.current += 1;
                let header = Header::new(self.current, self.data_source());
                Ok(Some(Record::new(header, payload)))
            }
            None => Ok(None),
        }
    }

    fn data_source(&self) -> String {
        format!("in-memory collection of {} items", self.total)
    }
}

/// Reads records in fixed-size chunks, emitting one [`MultiRecord`] per
/// chunk for batch-oriented writers. The final chunk may be smaller.
pub struct IterableMultiRecordReader<P> {
    delegate: IterableRecordReader<P>,
    chunk_size: usize,
    current: u64,
}

impl<P> IterableMultiRecordReader<P> {
    /// Create a chunked reader over `items`.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(items: Vec<P>, chunk_size: usize) -> Self {
        assert!(chunk_size >= 1, "chunk size must be at least 1");
        Self {
            delegate: IterableRecordReader::new(items),
            chunk_size,
            current: 0,
        }
    }
}

impl<P: Payload> RecordReader<Vec<Record<P>>> for IterableMultiRecordReader<P> {
    fn read_record(&mut self) -> Result<Option<MultiRecord<P>>> {
        let mut chunk = Vec::with_capacity(self.chunk_size);
        for _ in 0..self.chunk_size {
            match self.delegate.read_record()? {
                Some(record) => chunk.push(record),
                None => break,
            }
        }
        if chunk.is_empty() {
            return Ok(None);
        }
        self.current += 1;
        let header = Header::new(self.current, self.data_source());
        Ok(Some(Record::new(header, chunk)))
    }

    fn data_source(&self) -> String {
        format!(
            "{} in chunks of {}",
            RecordReader::<P>::data_source(&self.delegate),
            self.chunk_size
        )
    }
}

/// Reads records from a dispatcher-fed queue with a receive timeout.
///
/// Timeout policy: a timed-out receive is treated as end-of-stream, so a
/// consumer job never hangs forever on an idle queue. A received poison
/// record also ends the stream; it is consumed here and never reaches the
/// pipeline stages.
pub struct QueueRecordReader<P> {
    receiver: QueueReceiver<P>,
    timeout: Duration,
}

impl<P> QueueRecordReader<P> {
    /// Default receive timeout used by [`QueueRecordReader::new`].
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a queue reader with the default timeout.
    pub fn new(receiver: QueueReceiver<P>) -> Self {
        Self::with_timeout(receiver, Self::DEFAULT_TIMEOUT)
    }

    /// Create a queue reader with an explicit receive timeout.
    pub fn with_timeout(receiver: QueueReceiver<P>, timeout: Duration) -> Self {
        Self { receiver, timeout }
    }
}

impl<P: Payload> RecordReader<P> for QueueRecordReader<P> {
    fn read_record(&mut self) -> Result<Option<Record<P>>> {
        match self.receiver.recv_timeout(self.timeout) {
            Some(record) if record.is_poison() => {
                debug!("poison record received, ending stream");
                Ok(None)
            }
            Some(record) => Ok(Some(record)),
            // Timed out or all producers hung up: end of stream either way.
            None => Ok(None),
        }
    }

    fn data_source(&self) -> String {
        format!("queue (receive timeout {:?})", self.timeout)
    }
}

/// Decorator that retries a delegate reader's `read_record` on failure.
///
/// Whether an exhausted retry budget propagates the last error or turns into
/// end-of-stream is caller policy, configured with
/// [`end_of_stream_on_exhaustion`](Self::end_of_stream_on_exhaustion):
/// read semantics often treat "still failing" as "no more data", while
/// write-side retries must surface the failure.
pub struct RetryableRecordReader<R> {
    delegate: R,
    template: RetryTemplate,
    end_of_stream_on_exhaustion: bool,
}

impl<R> RetryableRecordReader<R> {
    /// Wrap `delegate`, retrying reads per `policy`.
    pub fn new(delegate: R, policy: RetryPolicy) -> Self {
        Self {
            delegate,
            template: RetryTemplate::new(policy),
            end_of_stream_on_exhaustion: false,
        }
    }

    /// Wrap `delegate` with a pre-built template (e.g. to attach hooks).
    pub fn with_template(delegate: R, template: RetryTemplate) -> Self {
        Self {
            delegate,
            template,
            end_of_stream_on_exhaustion: false,
        }
    }

    /// Treat an exhausted retry budget as end-of-stream instead of an error.
    #[must_use]
    pub fn end_of_stream_on_exhaustion(mut self, enabled: bool) -> Self {
        self.end_of_stream_on_exhaustion = enabled;
        self
    }
}

impl<P, R: RecordReader<P>> RecordReader<P> for RetryableRecordReader<R> {
    fn open(&mut self) -> Result<()> {
        self.delegate.open()
    }

    fn read_record(&mut self) -> Result<Option<Record<P>>> {
        let delegate = &mut self.delegate;
        match self.template.execute(|| delegate.read_record()) {
            Ok(record) => Ok(record),
            Err(e) if self.end_of_stream_on_exhaustion => {
                debug!("read retries exhausted, treating as end of stream: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.delegate.close()
    }

    fn data_source(&self) -> String {
        self.delegate.data_source()
    }
}
