//! Core record model: headers, records, batches, and the poison sentinel.
//!
//! A [`Record`] is one unit of input data plus its [`Header`] metadata, owned
//! by the pipeline for exactly one pass. Readers assign 1-based, strictly
//! increasing sequence numbers; downstream stages may replace the payload
//! type (`Record<A>` → `Record<B>`) but preserve the header unless a mapper
//! explicitly constructs a new one.
//!
//! A [`Batch`] is an insertion-ordered group of records flushed to a writer
//! together. A [`MultiRecord`] is a record whose payload is itself a list of
//! records, produced by chunked readers.
//!
//! The poison record (header number 0, source `"poison"`) carries no business
//! meaning: it exists solely to signal "no more input" to a consumer pulling
//! from a queue, and is never filtered, mapped, or validated.

use serde::Serialize;
use std::fmt;
use std::time::SystemTime;

/// Source label carried by poison record headers.
pub const POISON_SOURCE: &str = "poison";

/// Bound alias for record payloads flowing through pipelines.
///
/// Payloads must be sendable across job threads and cloneable so that
/// broadcast dispatching and listener observation can duplicate records.
pub trait Payload: Send + Clone + 'static {}
impl<T: Send + Clone + 'static> Payload for T {}

/// Metadata attached to every record by the reader that produced it.
///
/// Immutable once created. Sequence numbers are 1-based and strictly
/// increasing within a single reader's lifetime; number 0 is reserved for
/// the poison sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Header {
    number: u64,
    source: String,
    creation_time: SystemTime,
}

impl Header {
    /// Create a header for the `number`-th record of `source`.
    pub fn new(number: u64, source: impl Into<String>) -> Self {
        Self {
            number,
            source: source.into(),
            creation_time: SystemTime::now(),
        }
    }

    /// Create the distinguished poison header (number 0).
    #[must_use]
    pub fn poison() -> Self {
        Self::new(0, POISON_SOURCE)
    }

    /// 1-based sequence number of the record within its source.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Identifier of the data source that produced the record.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Instant at which the reader created the record.
    #[must_use]
    pub fn creation_time(&self) -> SystemTime {
        self.creation_time
    }

    /// True if this is the poison sentinel header.
    #[must_use]
    pub fn is_poison(&self) -> bool {
        self.number == 0 && self.source == POISON_SOURCE
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record #{} from {}", self.number, self.source)
    }
}

/// One unit of data flowing through a pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Record<P> {
    header: Header,
    payload: P,
}

impl<P> Record<P> {
    /// Create a record from a header and payload.
    pub fn new(header: Header, payload: P) -> Self {
        Self { header, payload }
    }

    /// The record's header metadata.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Borrow the payload.
    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consume the record, yielding its payload.
    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Split the record into header and payload.
    pub fn into_parts(self) -> (Header, P) {
        (self.header, self.payload)
    }

    /// Replace the payload, preserving the header.
    ///
    /// This is the usual way for a mapping stage to change the payload type
    /// without inventing new record metadata.
    pub fn map_payload<Q>(self, f: impl FnOnce(P) -> Q) -> Record<Q> {
        Record {
            header: self.header,
            payload: f(self.payload),
        }
    }

    /// True if this record is the poison sentinel.
    #[must_use]
    pub fn is_poison(&self) -> bool {
        self.header.is_poison()
    }
}

impl<P: Default> Record<P> {
    /// Create a poison record. The payload is inert filler; consumers must
    /// detect poison by header, never by payload inspection.
    #[must_use]
    pub fn poison() -> Self {
        Self {
            header: Header::poison(),
            payload: P::default(),
        }
    }
}

impl<P: fmt::Display> fmt::Display for Record<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.header, self.payload)
    }
}

/// A record whose payload is an ordered group of records, read as one unit.
pub type MultiRecord<P> = Record<Vec<Record<P>>>;

/// An ordered group of records written to a [`RecordWriter`] together.
///
/// Equality is structural: same records in the same order.
///
/// [`RecordWriter`]: crate::writer::RecordWriter
#[derive(Clone, Debug, PartialEq)]
pub struct Batch<P> {
    records: Vec<Record<P>>,
}

impl<P> Batch<P> {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Create an empty batch with room for `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Append a record, preserving insertion order.
    pub fn add(&mut self, record: Record<P>) {
        self.records.push(record);
    }

    /// Number of records in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the batch holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record<P>> {
        self.records.iter()
    }

    /// Consume the batch, yielding its records in insertion order.
    pub fn into_records(self) -> Vec<Record<P>> {
        self.records
    }
}

impl<P> Default for Batch<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> From<Vec<Record<P>>> for Batch<P> {
    fn from(records: Vec<Record<P>>) -> Self {
        Self { records }
    }
}

impl<P> IntoIterator for Batch<P> {
    type Item = Record<P>;
    type IntoIter = std::vec::IntoIter<Record<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, P> IntoIterator for &'a Batch<P> {
    type Item = &'a Record<P>;
    type IntoIter = std::slice::Iter<'a, Record<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
