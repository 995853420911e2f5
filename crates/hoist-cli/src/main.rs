mod cli;
mod config;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hoist_core::job::{jobs_from_directory, jobs_from_files};
use hoist_core::progress::{MultiReporter, NoopReporter, Reporter};
use hoist_core::retry::RetryPolicy;
use hoist_core::scheduler::{run_uploads, BatchSummary};
use hoist_core::session::SftpConnector;
use hoist_core::UploadOptions;

use crate::cli::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    init_logging(&args.log_file)?;

    let config = config::load(&args.config)?;
    let remote_dir = config.server.remote_dir.clone();
    let connector = SftpConnector::new(config.session());

    // Fail fast on bad credentials or a missing remote directory,
    // before enumerating anything
    connector.probe()?;

    let jobs = match &args.dir {
        Some(dir) => jobs_from_directory(dir, &remote_dir)?,
        None => jobs_from_files(args.files.clone(), &remote_dir),
    };
    if jobs.is_empty() {
        println!("nothing to upload");
        return Ok(());
    }
    info!(count = jobs.len(), "starting upload batch");

    let reporter: Box<dyn Reporter> = if args.quiet {
        Box::new(NoopReporter)
    } else {
        Box::new(MultiReporter::new())
    };
    let options = UploadOptions {
        concurrency: args.jobs,
        retry: RetryPolicy::new(args.retries, Duration::from_secs(args.retry_delay)),
    };

    let outcomes = run_uploads(jobs, &connector, reporter.as_ref(), &options);

    let summary = BatchSummary::from_outcomes(&outcomes);
    println!("{summary}");
    for outcome in outcomes.iter().filter(|o| !o.succeeded) {
        if let Some(err) = &outcome.error {
            eprintln!(
                "failed after {} attempt(s): {} ({})",
                outcome.attempts, outcome.job.remote_path, err.message
            );
        }
    }
    info!(%summary, "batch finished");

    // Per-file failures are not fatal; only a batch with zero
    // successes signals an error to the caller
    if summary.uploaded == 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("open log file {}", log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
