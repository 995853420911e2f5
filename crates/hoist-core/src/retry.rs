//! Bounded retry-with-delay around a single transfer attempt.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::errors::{ErrorCategory, TransferError};

/// Decides whether a failed attempt is worth repeating.
pub type Classifier = Arc<dyn Fn(&TransferError) -> bool + Send + Sync>;

/// Classifier that retries every failure, including permanent ones.
/// This is the default, matching the engine's original broad policy.
pub fn retry_all() -> Classifier {
    Arc::new(|_| true)
}

/// Classifier that only retries errors categorized as transient.
pub fn transient_only() -> Classifier {
    Arc::new(|err| err.category == ErrorCategory::Retryable)
}

/// Result of driving an operation through a [`RetryPolicy`].
pub struct RetryOutcome<T> {
    pub result: Result<T, TransferError>,
    /// Attempts actually made, between 1 and `max_attempts`.
    pub attempts: u32,
}

#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    classifier: Classifier,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            classifier: retry_all(),
        }
    }

    /// Replace the retry classifier.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Call `op` up to `max_attempts` times, sleeping `delay` between
    /// attempts. The closure receives the 1-based attempt number. On
    /// exhaustion the last error is returned, not any earlier one.
    pub fn run<T>(
        &self,
        mut op: impl FnMut(u32) -> Result<T, TransferError>,
    ) -> RetryOutcome<T> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op(attempt) {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(err) => {
                    if attempt >= self.max_attempts || !(self.classifier)(&err) {
                        return RetryOutcome {
                            result: Err(err),
                            attempts: attempt,
                        };
                    }
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "attempt failed, retrying after delay"
                    );
                    thread::sleep(self.delay);
                }
            }
        }
    }
}
