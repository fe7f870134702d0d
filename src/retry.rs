//! Generic retry-with-backoff around any fallible operation.
//!
//! A [`RetryTemplate`] executes a zero-argument operation, retrying on error
//! according to an immutable [`RetryPolicy`], with [`RetryListener`] hooks
//! for observability. Sleeps block only the calling thread: this is
//! cooperative backoff, not a global rate limiter.
//!
//! # Example
//!
//! ```
//! use batchflow::retry::{RetryPolicy, RetryTemplate};
//! use std::time::Duration;
//!
//! let mut template = RetryTemplate::new(RetryPolicy::new(3, Duration::ZERO));
//! let mut calls = 0;
//! let result: anyhow::Result<u32> = template.execute(|| {
//!     calls += 1;
//!     if calls < 3 {
//!         anyhow::bail!("transient")
//!     }
//!     Ok(42)
//! });
//! assert_eq!(result.unwrap(), 42);
//! assert_eq!(calls, 3);
//! ```

use anyhow::{Error, Result};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;
use tracing::debug;

/// Immutable retry configuration.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy allowing `max_attempts` total attempts with `delay`
    /// between consecutive attempts.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is zero.
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        assert!(max_attempts >= 1, "max attempts must be at least 1");
        Self {
            max_attempts,
            delay,
        }
    }

    /// Total number of attempts, including the first.
    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay between consecutive attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Lifecycle hooks invoked around retried operations.
///
/// All methods default to no-ops; implement only what you observe.
pub trait RetryListener: Send + Sync {
    /// Called before each attempt.
    fn before_call(&self) {}

    /// Called after a successful attempt.
    fn after_call(&self) {}

    /// Called whenever an attempt fails; `attempt` is 1-based.
    fn on_exception(&self, _error: &Error, _attempt: usize) {}

    /// Called before sleeping ahead of the next attempt.
    fn before_wait(&self, _attempt: usize) {}

    /// Called after sleeping, immediately before the next attempt.
    fn after_wait(&self, _attempt: usize) {}

    /// Called once, after the final attempt has failed.
    fn on_max_attempts(&self, _error: &Error) {}
}

/// Executes fallible operations with retries per a [`RetryPolicy`].
pub struct RetryTemplate {
    policy: RetryPolicy,
    listeners: Vec<Arc<dyn RetryListener>>,
}

impl RetryTemplate {
    /// Create a template with no listeners.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            listeners: Vec::new(),
        }
    }

    /// Attach a listener. Listeners fire in registration order.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn RetryListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// The policy this template applies.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Execute `operation`, retrying on error.
    ///
    /// Returns the first successful result, or the error of the final
    /// attempt once the policy's attempt budget is exhausted. What an
    /// exhausted budget means (propagate vs. end-of-stream) is the caller's
    /// policy, not this template's.
    pub fn execute<T>(&mut self, mut operation: impl FnMut() -> Result<T>) -> Result<T> {
        let max_attempts = self.policy.max_attempts;
        let delay = self.policy.delay;
        let mut attempt = 0;
        loop {
            attempt += 1;
            for l in &self.listeners {
                l.before_call();
            }
            match operation() {
                Ok(result) => {
                    for l in &self.listeners {
                        l.after_call();
                    }
                    return Ok(result);
                }
                Err(error) => {
                    debug!("attempt {attempt}/{max_attempts} failed: {error}");
                    for l in &self.listeners {
                        l.on_exception(&error, attempt);
                    }
                    if attempt >= max_attempts {
                        for l in &self.listeners {
                            l.on_max_attempts(&error);
                        }
                        return Err(error);
                    }
                    for l in &self.listeners {
                        l.before_wait(attempt);
                    }
                    sleep(delay);
                    for l in &self.listeners {
                        l.after_wait(attempt);
                    }
                }
            }
        }
    }
}
