//! Bounded worker pool that drains the job list.
//!
//! Workers pull jobs from a shared channel until it is empty. Each
//! worker owns its own transport, dialed lazily on the first job and
//! re-dialed after a failed attempt. A job that exhausts its retries
//! is recorded as failed; the batch always runs to completion.

use std::fs;
use std::thread;

use crossbeam_channel::bounded;
use parking_lot::Mutex;
use tracing::{error, info};

use crate::errors::{SetupError, TransferError};
use crate::job::UploadJob;
use crate::progress::Reporter;
use crate::session::{Connector, Transport};
use crate::UploadOptions;

/// Terminal result of one job.
#[derive(Debug)]
pub struct TransferOutcome {
    pub job: UploadJob,
    pub succeeded: bool,
    /// Attempts made, between 1 and the policy's maximum.
    pub attempts: u32,
    pub error: Option<TransferError>,
}

/// Aggregate view of a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub uploaded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[TransferOutcome]) -> Self {
        let uploaded = outcomes.iter().filter(|o| o.succeeded).count();
        Self {
            total: outcomes.len(),
            uploaded,
            failed: outcomes.len() - uploaded,
        }
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "uploaded {}/{} files ({} failed)",
            self.uploaded, self.total, self.failed
        )
    }
}

/// Run every job to an outcome. Launches up to `options.concurrency`
/// workers; returns once all jobs have been processed, one outcome per
/// job, in no particular order.
pub fn run_uploads(
    jobs: Vec<UploadJob>,
    connector: &dyn Connector,
    reporter: &dyn Reporter,
    options: &UploadOptions,
) -> Vec<TransferOutcome> {
    if jobs.is_empty() {
        return Vec::new();
    }

    let workers = options.concurrency.max(1).min(jobs.len());
    let (tx, rx) = bounded::<UploadJob>(jobs.len());
    for job in jobs {
        // Channel is sized for the whole batch, send cannot block
        let _ = tx.send(job);
    }
    drop(tx);

    let outcomes: Mutex<Vec<TransferOutcome>> = Mutex::new(Vec::new());

    thread::scope(|scope| {
        for _ in 0..workers {
            let rx = rx.clone();
            let outcomes = &outcomes;
            scope.spawn(move || {
                let mut transport: Option<Box<dyn Transport>> = None;
                while let Ok(job) = rx.recv() {
                    let outcome = process_job(job, &mut transport, connector, reporter, options);
                    outcomes.lock().push(outcome);
                }
            });
        }
    });

    outcomes.into_inner()
}

fn process_job(
    job: UploadJob,
    transport: &mut Option<Box<dyn Transport>>,
    connector: &dyn Connector,
    reporter: &dyn Reporter,
    options: &UploadOptions,
) -> TransferOutcome {
    info!(file = %job.local_path.display(), remote = %job.remote_path, "uploading");

    let file_name = job
        .local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| job.local_path.display().to_string());
    let total_bytes = fs::metadata(&job.local_path).map(|m| m.len()).unwrap_or(0);
    let mut tracker = reporter.tracker(&file_name, total_bytes);

    let retried = options.retry.run(|_attempt| {
        let mut live = match transport.take() {
            Some(t) => t,
            None => connector
                .connect()
                .map_err(|e| connect_error(&e, &job.remote_path))?,
        };
        let result = live.upload(&job.local_path, &job.remote_path, &mut |transferred, _| {
            tracker.update(transferred)
        });
        if result.is_ok() {
            *transport = Some(live);
        }
        // On error the transport is dropped: the channel may be
        // wedged, so the next attempt dials fresh
        result
    });
    tracker.finish();

    match retried.result {
        Ok(()) => {
            info!(file = %file_name, attempts = retried.attempts, "upload succeeded");
            TransferOutcome {
                job,
                succeeded: true,
                attempts: retried.attempts,
                error: None,
            }
        }
        Err(err) => {
            error!(
                file = %file_name,
                attempts = retried.attempts,
                error = %err,
                "upload failed"
            );
            TransferOutcome {
                job,
                succeeded: false,
                attempts: retried.attempts,
                error: Some(err),
            }
        }
    }
}

/// A mid-batch connect failure is scoped to the job being attempted.
/// Auth and key problems will not fix themselves on a retry; network
/// failures might.
fn connect_error(err: &SetupError, remote_path: &str) -> TransferError {
    match err {
        SetupError::MissingKey(_) | SetupError::Auth(_) => {
            TransferError::fatal(err.to_string(), Some(remote_path.to_string()))
        }
        _ => TransferError::retryable(err.to_string(), Some(remote_path.to_string())),
    }
}
