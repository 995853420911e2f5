use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hoist")]
#[command(about = "Concurrent bulk file uploads over SFTP")]
#[command(after_help = "Server and credential settings come from the TOML config file.")]
pub struct Cli {
    /// Local files to upload, placed flat under the remote directory
    #[arg(required_unless_present = "dir", conflicts_with = "dir")]
    pub files: Vec<PathBuf>,
    /// Upload a directory tree recursively, preserving its layout
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,
    /// Configuration file with server and credential settings
    #[arg(long, default_value = "hoist.toml", value_name = "PATH")]
    pub config: PathBuf,
    /// Number of concurrent upload workers
    #[arg(long, short = 'j', default_value_t = 5)]
    pub jobs: usize,
    /// Maximum upload attempts per file (1-255)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=255))]
    pub retries: u32,
    /// Seconds to wait between attempts on the same file
    #[arg(long, default_value_t = 10, value_name = "SECS")]
    pub retry_delay: u64,
    /// Suppress per-file progress bars
    #[arg(long, short = 'q')]
    pub quiet: bool,
    /// Append structured logs to this file
    #[arg(long, default_value = "upload.log", value_name = "PATH")]
    pub log_file: PathBuf,
}
