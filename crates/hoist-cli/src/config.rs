//! TOML configuration: server coordinates and credentials.
//!
//! ```toml
//! [server]
//! hostname = "files.example.net"
//! port = 22
//! remote_dir = "/srv/incoming"
//!
//! [credentials]
//! username = "uploader"
//! private_key_path = "/home/op/.ssh/id_ed25519"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::Deserialize;

use hoist_core::session::SessionConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerSection,
    pub credentials: CredentialsSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub remote_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsSection {
    pub username: String,
    pub private_key_path: PathBuf,
}

fn default_port() -> u16 {
    22
}

pub fn load(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse config file {}", path.display()))
}

impl Config {
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            hostname: self.server.hostname.clone(),
            port: self.server.port,
            username: self.credentials.username.clone(),
            private_key_path: self.credentials.private_key_path.clone(),
            remote_dir: self.server.remote_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [server]
        hostname = "files.example.net"
        port = 2222
        remote_dir = "/srv/incoming"

        [credentials]
        username = "uploader"
        private_key_path = "/keys/id_ed25519"
    "#;

    #[test]
    fn parses_all_fields() {
        let config: Config = toml::from_str(FULL).unwrap();
        assert_eq!(config.server.hostname, "files.example.net");
        assert_eq!(config.server.port, 2222);
        let session = config.session();
        assert_eq!(session.remote_dir, "/srv/incoming");
        assert_eq!(session.private_key_path, PathBuf::from("/keys/id_ed25519"));
    }

    #[test]
    fn port_defaults_to_22() {
        let config: Config = toml::from_str(
            r#"
            [server]
            hostname = "h"
            remote_dir = "/in"
            [credentials]
            username = "u"
            private_key_path = "/k"
        "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 22);
    }

    #[test]
    fn missing_credentials_section_fails() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [server]
            hostname = "h"
            remote_dir = "/in"
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn load_reads_a_config_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hoist.toml");
        fs::write(&path, FULL).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.server.hostname, "files.example.net");
        assert_eq!(config.credentials.username, "uploader");
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(load(Path::new("/nonexistent/hoist.toml")).is_err());
    }
}
