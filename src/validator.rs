//! Record validators: reject records that fail domain rules.
//!
//! Validators run in registration order; the first rejection wins. A
//! rejection is a stage outcome, not an engine error: the record is counted
//! as skipped and the loop continues (or aborts, under the job's
//! abort-on-first-reject flag).

use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rejection produced by a validator, with optional field context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// The field that failed validation, when one can be named.
    pub field: Option<String>,
    /// Human-readable rejection reason.
    pub message: String,
}

impl ValidationError {
    /// Create a record-level rejection.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// Create a field-level rejection.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Checks one record against domain rules.
pub trait RecordValidator<P>: Send {
    /// Validate the record; `Err` carries the rejection reason.
    fn validate(&self, record: &Record<P>) -> Result<(), ValidationError>;
}

impl<P, F> RecordValidator<P> for F
where
    F: Fn(&Record<P>) -> Result<(), ValidationError> + Send,
{
    fn validate(&self, record: &Record<P>) -> Result<(), ValidationError> {
        self(record)
    }
}
