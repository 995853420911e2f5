//! Expansion of a selection into a flat list of upload jobs.

use std::path::{Path, PathBuf};

use eyre::{bail, Result};
use walkdir::WalkDir;

/// One local-file-to-remote-path upload task. Immutable once created;
/// the remote path is always forward-slash separated regardless of the
/// local platform's convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub local_path: PathBuf,
    pub remote_path: String,
}

/// Build jobs for an explicit file list. Each file lands flat in
/// `remote_dir` under its base name; paths without one are skipped.
pub fn jobs_from_files<I, P>(paths: I, remote_dir: &str) -> Vec<UploadJob>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    paths
        .into_iter()
        .filter_map(|p| {
            let local_path = p.into();
            // Paths like "/" or "x/.." carry no base name and could
            // only ever target the remote directory itself
            let Some(name) = local_path.file_name() else {
                tracing::warn!(
                    path = %local_path.display(),
                    "skipping path with no file name"
                );
                return None;
            };
            let remote_path = join_remote(remote_dir, Path::new(name));
            Some(UploadJob {
                local_path,
                remote_path,
            })
        })
        .collect()
}

/// Recursively walk `local_dir` and build one job per regular file,
/// preserving each file's path relative to `local_dir` under
/// `remote_dir`. Symlinks are not followed and produce no jobs. An
/// empty directory yields an empty list. No traversal order is
/// guaranteed.
pub fn jobs_from_directory(local_dir: &Path, remote_dir: &str) -> Result<Vec<UploadJob>> {
    if !local_dir.is_dir() {
        bail!("not a directory: {}", local_dir.display());
    }

    let mut jobs = Vec::new();
    for entry in WalkDir::new(local_dir).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                if err.depth() == 0 {
                    return Err(err.into());
                }
                // Unreadable subtree entries are skipped, not fatal
                tracing::warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(local_dir)
            .unwrap_or(entry.path());
        jobs.push(UploadJob {
            local_path: entry.path().to_path_buf(),
            remote_path: join_remote(remote_dir, rel),
        });
    }
    Ok(jobs)
}

/// Join a relative path under a remote base with forward slashes.
fn join_remote(remote_dir: &str, rel: &Path) -> String {
    let mut out = remote_dir.trim_end_matches('/').to_string();
    for comp in rel.components() {
        out.push('/');
        out.push_str(&comp.as_os_str().to_string_lossy());
    }
    out
}
