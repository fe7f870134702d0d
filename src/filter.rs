//! Record filters: drop records before they enter the mapping stage.
//!
//! Filters are predicates tried in registration order; the first match
//! short-circuits the remaining pipeline stages for that record and counts
//! it as filtered. Filtering never fails.

use crate::record::Record;

/// Decides whether a record should be filtered out of the pipeline.
pub trait RecordFilter<P>: Send {
    /// Return `true` to filter the record out.
    fn matches(&self, record: &Record<P>) -> bool;
}

/// Filters the poison sentinel so it never reaches map/process/write when a
/// consumer wires a raw queue receiver straight into a job.
pub struct PoisonRecordFilter;

impl<P> RecordFilter<P> for PoisonRecordFilter {
    fn matches(&self, record: &Record<P>) -> bool {
        record.is_poison()
    }
}

/// Filters records whose header number falls outside `[start, end]`.
///
/// Handy for re-running a slice of a data source.
pub struct RangeRecordFilter {
    start: u64,
    end: u64,
}

impl RangeRecordFilter {
    /// Keep only records numbered within `[start, end]` (inclusive).
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

impl<P> RecordFilter<P> for RangeRecordFilter {
    fn matches(&self, record: &Record<P>) -> bool {
        let n = record.header().number();
        n < self.start || n > self.end
    }
}

impl<P, F> RecordFilter<P> for F
where
    F: Fn(&Record<P>) -> bool + Send,
{
    fn matches(&self, record: &Record<P>) -> bool {
        self(record)
    }
}
