//! Record mappers: convert raw payloads to domain types.
//!
//! The mapping stage is the one place in the pipeline where the payload
//! type is allowed to change (`Record<I>` → `Record<O>`). A mapping failure
//! is counted and, depending on job configuration, skips the record or
//! aborts the run.
//!
//! [`FieldMap`] replaces convention-based field discovery with an explicit,
//! ordered table of `(source key, target field, converter)` entries declared
//! at configuration time and validated once at build, instead of per record.

use crate::record::{Payload, Record};
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::collections::HashMap;

/// Converts a record's payload to a domain type, preserving the header
/// unless the implementation deliberately constructs a new one.
pub trait RecordMapper<I, O>: Send {
    /// Map one record.
    fn map_record(&self, record: Record<I>) -> Result<Record<O>>;
}

/// Passes records through unchanged. Default mapper for untyped pipelines.
pub struct IdentityRecordMapper;

impl<P: Payload> RecordMapper<P, P> for IdentityRecordMapper {
    fn map_record(&self, record: Record<P>) -> Result<Record<P>> {
        Ok(record)
    }
}

impl<I, O, F> RecordMapper<I, O> for F
where
    F: Fn(Record<I>) -> Result<Record<O>> + Send,
{
    fn map_record(&self, record: Record<I>) -> Result<Record<O>> {
        self(record)
    }
}

/// Converter applied to one source value while building a target field.
pub type FieldConverter = Box<dyn Fn(&str) -> Result<Value> + Send + Sync>;

struct FieldMapping {
    source_key: String,
    target_field: String,
    converter: FieldConverter,
}

/// An ordered, statically declared field-mapping table.
///
/// Each entry names a source key, a target field, and a converter from the
/// raw string value to a JSON value. The table is validated when the mapper
/// is built — duplicate targets and empty names are configuration errors —
/// so per-record mapping never re-checks the declaration.
///
/// # Example
///
/// ```
/// use batchflow::mapper::FieldMap;
///
/// let map = FieldMap::new()
///     .field("id", "user_id", |raw| Ok(raw.parse::<u64>()?.into()))
///     .text("name", "display_name");
/// let mapper = map.into_mapper().unwrap();
/// ```
#[derive(Default)]
pub struct FieldMap {
    entries: Vec<FieldMapping>,
}

impl FieldMap {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a mapping from `source_key` to `target_field` through
    /// `converter`.
    #[must_use]
    pub fn field(
        mut self,
        source_key: impl Into<String>,
        target_field: impl Into<String>,
        converter: impl Fn(&str) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.entries.push(FieldMapping {
            source_key: source_key.into(),
            target_field: target_field.into(),
            converter: Box::new(converter),
        });
        self
    }

    /// Declare a verbatim string mapping from `source_key` to
    /// `target_field`.
    #[must_use]
    pub fn text(self, source_key: impl Into<String>, target_field: impl Into<String>) -> Self {
        self.field(source_key, target_field, |raw| Ok(Value::String(raw.to_string())))
    }

    /// Validate the table and build the mapper.
    ///
    /// # Errors
    ///
    /// Fails if the table is empty, a name is empty, or two entries declare
    /// the same target field.
    pub fn into_mapper(self) -> Result<FieldMapRecordMapper> {
        if self.entries.is_empty() {
            bail!("field map declares no entries");
        }
        let mut seen_targets = HashMap::new();
        for entry in &self.entries {
            if entry.source_key.is_empty() || entry.target_field.is_empty() {
                bail!("field map entries must name a source key and a target field");
            }
            if let Some(previous) = seen_targets.insert(entry.target_field.as_str(), &entry.source_key)
            {
                bail!(
                    "target field '{}' is mapped from both '{}' and '{}'",
                    entry.target_field,
                    previous,
                    entry.source_key
                );
            }
        }
        Ok(FieldMapRecordMapper {
            entries: self.entries,
        })
    }
}

/// Maps `HashMap<String, String>` payloads to JSON objects through a
/// validated [`FieldMap`].
///
/// Missing source keys are mapping errors, as is any converter failure.
pub struct FieldMapRecordMapper {
    entries: Vec<FieldMapping>,
}

impl RecordMapper<HashMap<String, String>, Value> for FieldMapRecordMapper {
    fn map_record(&self, record: Record<HashMap<String, String>>) -> Result<Record<Value>> {
        let (header, payload) = record.into_parts();
        let mut target = serde_json::Map::with_capacity(self.entries.len());
        for entry in &self.entries {
            let raw = payload
                .get(&entry.source_key)
                .with_context(|| format!("source key '{}' is missing", entry.source_key))?;
            let value = (entry.converter)(raw)
                .with_context(|| format!("cannot convert field '{}'", entry.source_key))?;
            target.insert(entry.target_field.clone(), value);
        }
        Ok(Record::new(header, Value::Object(target)))
    }
}
