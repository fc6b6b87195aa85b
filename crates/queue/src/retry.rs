//! Job error taxonomy and retry policy.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use apalis::layers::retry::RetryPolicy;
use apalis::prelude::Error;

/// Classified job failure.
///
/// Workers return this instead of a bare error so the queue knows
/// whether redelivery can help.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Transient failure; the queue should redeliver the job.
    #[error("retryable: {0}")]
    Retryable(String),
    /// Permanent failure; redelivering the same payload cannot succeed.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl From<JobError> for Error {
    fn from(err: JobError) -> Self {
        let fatal = matches!(err, JobError::Fatal(_));
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
        if fatal {
            Self::Abort(Arc::new(boxed))
        } else {
            Self::Failed(Arc::new(boxed))
        }
    }
}

/// Retry configuration with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(3600 * 6),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Apalis retry policy bounded by the configured attempt count.
    ///
    /// Workers install this so a `Retryable` failure is redelivered at
    /// most `max_retries` times before the job is dropped.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::retries(self.max_retries as usize)
    }

    /// Calculate delay for the given attempt number (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt >= self.max_retries {
            return self.max_delay;
        }

        let delay_secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let delay = Duration::from_secs_f64(delay_secs);

        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }

    /// Check if we should retry after the given number of attempts.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}
