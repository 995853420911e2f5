//! Error taxonomy for the upload engine.
//!
//! Failures fall into two buckets:
//! - Setup errors: fatal, detected before any transfer starts (missing
//!   key, connect/auth failure, missing remote directory).
//! - Transfer errors: scoped to one file, handled by the retry policy
//!   and recorded in that job's outcome.

use std::io;
use std::path::PathBuf;

/// Category of a transfer error for retry decision-making.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient failure - a retry may succeed (timeout, reset, etc.)
    Retryable,
    /// Permanent failure - a retry will never succeed (permissions,
    /// missing local file, full remote disk).
    Fatal,
}

/// Fatal error raised during connection setup, before any upload.
#[derive(Debug)]
pub enum SetupError {
    /// The configured private key does not exist or is unreadable.
    MissingKey(PathBuf),
    /// TCP connect or SSH handshake failed.
    Connection(String),
    /// Public-key authentication was rejected.
    Auth(String),
    /// The configured remote base directory does not exist.
    RemoteDirMissing(String),
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::MissingKey(path) => {
                write!(f, "private key not found or unreadable: {}", path.display())
            }
            SetupError::Connection(msg) => write!(f, "could not establish connection: {msg}"),
            SetupError::Auth(msg) => write!(f, "authentication failed: {msg}"),
            SetupError::RemoteDirMissing(dir) => {
                write!(f, "remote directory does not exist: {dir}")
            }
        }
    }
}

impl std::error::Error for SetupError {}

/// A per-file transfer error with its category.
#[derive(Debug, Clone)]
pub struct TransferError {
    /// The underlying error message.
    pub message: String,
    /// The remote path that failed (if known).
    pub path: Option<String>,
    /// The error category for retry decisions.
    pub category: ErrorCategory,
}

impl TransferError {
    pub fn retryable(message: impl Into<String>, path: Option<String>) -> Self {
        Self {
            message: message.into(),
            path,
            category: ErrorCategory::Retryable,
        }
    }

    pub fn fatal(message: impl Into<String>, path: Option<String>) -> Self {
        Self {
            message: message.into(),
            path,
            category: ErrorCategory::Fatal,
        }
    }

    /// Wrap an IO error, categorizing it by kind.
    pub fn from_io(err: &io::Error, path: Option<String>) -> Self {
        Self {
            message: err.to_string(),
            path,
            category: categorize_io_error(err),
        }
    }

    /// Wrap an SSH-layer error, categorizing it by message.
    pub fn from_ssh(err: &ssh2::Error, path: Option<String>) -> Self {
        Self {
            message: err.to_string(),
            path,
            category: categorize_message(&err.to_string()),
        }
    }
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {}", path, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for TransferError {}

/// Categorize an IO error for retry decisions.
pub fn categorize_io_error(err: &io::Error) -> ErrorCategory {
    match err.kind() {
        // Retryable: transient conditions
        io::ErrorKind::TimedOut
        | io::ErrorKind::Interrupted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::WouldBlock => ErrorCategory::Retryable,

        // Fatal: permanent conditions
        io::ErrorKind::PermissionDenied
        | io::ErrorKind::NotFound
        | io::ErrorKind::InvalidData
        | io::ErrorKind::InvalidInput => ErrorCategory::Fatal,

        // Unknown errors - treat as fatal to avoid retry loops
        _ => ErrorCategory::Fatal,
    }
}

/// Categorize an error by message text. Used for SSH-layer errors,
/// which surface libssh2 strings rather than IO kinds.
pub fn categorize_message(msg: &str) -> ErrorCategory {
    let msg = msg.to_lowercase();
    if msg.contains("timed out")
        || msg.contains("timeout")
        || msg.contains("connection reset")
        || msg.contains("broken pipe")
        || msg.contains("would block")
        || msg.contains("interrupted")
        || msg.contains("disconnect")
        || msg.contains("eof")
    {
        return ErrorCategory::Retryable;
    }
    if msg.contains("permission denied")
        || msg.contains("no such file")
        || msg.contains("no space left")
        || msg.contains("quota")
    {
        return ErrorCategory::Fatal;
    }
    // Unknown SSH errors lean retryable; the attempt cap bounds the cost
    ErrorCategory::Retryable
}
