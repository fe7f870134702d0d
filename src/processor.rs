//! Record processors: the business-logic stages of a pipeline.
//!
//! Processors form an ordered chain; each stage receives the previous
//! stage's output. Returning `Ok(None)` drops the record silently without
//! error accounting, short-circuiting the rest of the chain. An `Err`
//! counts against the job's error threshold and, under strict mode, aborts
//! the run.

use crate::record::Record;
use anyhow::Result;

/// One business-logic stage of the processing chain.
pub trait RecordProcessor<P>: Send {
    /// Process one record. `Ok(None)` means "drop silently".
    fn process_record(&self, record: Record<P>) -> Result<Option<Record<P>>>;
}

impl<P, F> RecordProcessor<P> for F
where
    F: Fn(Record<P>) -> Result<Option<Record<P>>> + Send,
{
    fn process_record(&self, record: Record<P>) -> Result<Option<Record<P>>> {
        self(record)
    }
}

/// Runs an ordered chain of processors, feeding each stage's output to the
/// next and short-circuiting when a stage drops the record.
pub struct CompositeRecordProcessor<P> {
    processors: Vec<Box<dyn RecordProcessor<P>>>,
}

impl<P> CompositeRecordProcessor<P> {
    /// Create an empty chain (records pass through unchanged).
    #[must_use]
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Append a processor to the end of the chain.
    pub fn add(&mut self, processor: Box<dyn RecordProcessor<P>>) {
        self.processors.push(processor);
    }

    /// Number of stages in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// True if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl<P> Default for CompositeRecordProcessor<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> RecordProcessor<P> for CompositeRecordProcessor<P> {
    fn process_record(&self, record: Record<P>) -> Result<Option<Record<P>>> {
        let mut current = record;
        for processor in &self.processors {
            match processor.process_record(current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}
