pub mod errors;
pub mod job;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod session;

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Knobs for one upload batch.
#[derive(Clone)]
pub struct UploadOptions {
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            concurrency: 5,
            retry: RetryPolicy::new(3, Duration::from_secs(10)),
        }
    }
}
