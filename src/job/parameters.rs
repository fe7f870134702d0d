//! Immutable job configuration.

use serde::Serialize;

/// Configuration captured at build time and read-only during execution.
#[derive(Clone, Debug, Serialize)]
pub struct JobParameters {
    /// Job name, used in logs and reports.
    pub name: String,
    /// Number of records read per batch before writing. At least 1.
    pub batch_size: usize,
    /// Abort the run once this many per-record errors have accumulated.
    /// `None` means unbounded.
    pub error_threshold: Option<u64>,
    /// Abort on the first mapping or processing error.
    pub strict_mode: bool,
    /// Abort on the first validation rejection.
    pub abort_on_first_reject: bool,
    /// Abort on the first mapping error, even outside strict mode.
    pub abort_on_first_mapping_error: bool,
    /// Continue with the next batch after a write failure instead of
    /// failing the job. The failed batch's records count as errors.
    pub continue_on_write_error: bool,
    /// Invoke the registered monitoring observer with report snapshots.
    pub monitoring_enabled: bool,
}

impl JobParameters {
    /// Default job name when none is given.
    pub const DEFAULT_NAME: &'static str = "job";

    /// Parameters with a name and all defaults: batch size 1, unbounded
    /// error threshold, every abort flag off, monitoring off.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batch_size: 1,
            error_threshold: None,
            strict_mode: false,
            abort_on_first_reject: false,
            abort_on_first_mapping_error: false,
            continue_on_write_error: false,
            monitoring_enabled: false,
        }
    }
}

impl Default for JobParameters {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }
}
