//! SFTP transport over ssh2.
//!
//! Authentication is public-key only and non-interactive. The remote
//! host's identity is accepted without a known-hosts check; that is
//! the engine's documented trust policy, not an oversight.
//!
//! libssh2 sessions make no guarantee about concurrent independent
//! streams on one channel, so every worker dials its own session via
//! [`Connector::connect`]. Teardown is scoped: dropping a transport
//! disconnects its session even when setup only partially completed.

use std::fs::File;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::errors::{SetupError, TransferError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const IO_TIMEOUT: Duration = Duration::from_secs(30);
const CHUNK_SIZE: usize = 1024 * 1024;

/// Connection parameters for one remote host.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub private_key_path: PathBuf,
    pub remote_dir: String,
}

/// One authenticated SFTP channel, owned by a single worker.
pub trait Transport: Send {
    /// Stream a local file to `remote_path`, creating or overwriting
    /// it. `on_progress` receives cumulative (transferred, total)
    /// byte counts as chunks land.
    fn upload(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<(), TransferError>;
}

/// Dials fresh transports, one per worker.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Transport>, SetupError>;
}

/// ssh2-backed connector.
pub struct SftpConnector {
    config: SessionConfig,
}

impl SftpConnector {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Startup check: dial once and verify the configured remote base
    /// directory exists. Runs before any upload; a failure here is
    /// fatal for the whole batch.
    pub fn probe(&self) -> Result<(), SetupError> {
        let transport = self.dial()?;
        let dir = Path::new(&self.config.remote_dir);
        match transport.sftp.stat(dir) {
            Ok(stat) if stat.is_dir() => {
                debug!(remote_dir = %self.config.remote_dir, "remote directory present");
                Ok(())
            }
            _ => Err(SetupError::RemoteDirMissing(self.config.remote_dir.clone())),
        }
    }

    fn dial(&self) -> Result<SftpTransport, SetupError> {
        let cfg = &self.config;

        if !cfg.private_key_path.is_file() {
            return Err(SetupError::MissingKey(cfg.private_key_path.clone()));
        }

        info!(host = %cfg.hostname, user = %cfg.username, "connecting");

        let addr = (cfg.hostname.as_str(), cfg.port)
            .to_socket_addrs()
            .map_err(|e| SetupError::Connection(e.to_string()))?
            .next()
            .ok_or_else(|| {
                SetupError::Connection(format!("no address for {}", cfg.hostname))
            })?;
        let tcp = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
            .map_err(|e| SetupError::Connection(e.to_string()))?;
        let _ = tcp.set_read_timeout(Some(IO_TIMEOUT));
        let _ = tcp.set_write_timeout(Some(IO_TIMEOUT));

        let mut sess =
            ssh2::Session::new().map_err(|e| SetupError::Connection(e.to_string()))?;
        sess.set_tcp_stream(tcp);
        sess.handshake().map_err(|e| {
            error!(host = %cfg.hostname, error = %e, "handshake failed");
            SetupError::Connection(e.to_string())
        })?;

        sess.userauth_pubkey_file(&cfg.username, None, &cfg.private_key_path, None)
            .map_err(|e| {
                error!(user = %cfg.username, error = %e, "authentication failed");
                SetupError::Auth(e.to_string())
            })?;
        if !sess.authenticated() {
            return Err(SetupError::Auth("public key rejected".to_string()));
        }

        let sftp = sess
            .sftp()
            .map_err(|e| SetupError::Connection(e.to_string()))?;

        info!(host = %cfg.hostname, "connected");
        Ok(SftpTransport { sess, sftp })
    }
}

impl Connector for SftpConnector {
    fn connect(&self) -> Result<Box<dyn Transport>, SetupError> {
        Ok(Box::new(self.dial()?))
    }
}

struct SftpTransport {
    sess: ssh2::Session,
    sftp: ssh2::Sftp,
}

impl Transport for SftpTransport {
    fn upload(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<(), TransferError> {
        let remote = Some(remote_path.to_string());

        let mut local = File::open(local_path)
            .map_err(|e| TransferError::from_io(&e, remote.clone()))?;
        let total = local
            .metadata()
            .map_err(|e| TransferError::from_io(&e, remote.clone()))?
            .len();

        self.ensure_parents(remote_path)?;

        let mut remote_file = self
            .sftp
            .create(Path::new(remote_path))
            .map_err(|e| TransferError::from_ssh(&e, remote.clone()))?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut transferred = 0u64;
        loop {
            let n = local
                .read(&mut buf)
                .map_err(|e| TransferError::from_io(&e, remote.clone()))?;
            if n == 0 {
                break;
            }
            std::io::Write::write_all(&mut remote_file, &buf[..n])
                .map_err(|e| TransferError::from_io(&e, remote.clone()))?;
            transferred += n as u64;
            on_progress(transferred, total);
        }
        Ok(())
    }
}

impl SftpTransport {
    /// Create any missing directories above `remote_path`. Nested jobs
    /// from a directory walk land under subdirectories that may not
    /// exist on the remote yet.
    fn ensure_parents(&self, remote_path: &str) -> Result<(), TransferError> {
        let Some(parent) = remote_path.rsplit_once('/').map(|(dir, _)| dir) else {
            return Ok(());
        };
        let mut acc = String::new();
        for part in parent.split('/') {
            if part.is_empty() {
                if acc.is_empty() {
                    acc.push('/');
                }
                continue;
            }
            if !acc.ends_with('/') {
                acc.push('/');
            }
            acc.push_str(part);
            let p = Path::new(&acc);
            if self.sftp.stat(p).is_err() {
                // Races with other workers creating the same dir are fine
                let _ = self.sftp.mkdir(p, 0o755);
            }
        }
        Ok(())
    }
}

impl Drop for SftpTransport {
    fn drop(&mut self) {
        let _ = self.sess.disconnect(None, "done", None);
    }
}
