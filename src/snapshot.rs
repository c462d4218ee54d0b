//! Safety copy of the source tree taken before a run.
//!
//! The copy is deleted only by `commit`, after the run succeeded and the
//! source tree is drained. Any other way out (an error, a panic, a tree that
//! still holds data) leaves it on disk for inspection.

use chrono::Local;
use fs_extra::dir::{self, CopyOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{io_err, Result, ShiftError};

/// Result of trying to discard a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Discarded,
    /// Source tree still holds `residual_bytes`
    Retained { path: PathBuf, residual_bytes: u64 },
}

#[derive(Debug)]
pub struct Snapshot {
    source: PathBuf,
    path: PathBuf,
    committed: bool,
}

impl Snapshot {
    /// Copy `source` into a new timestamped folder under `snapshot_dir`
    pub fn take(source: &Path, snapshot_dir: &Path) -> Result<Self> {
        let path = snapshot_dir.join(Local::now().format("%Y-%m-%d_%H-%M-%S").to_string());
        fs::create_dir_all(&path).map_err(io_err("create", &path))?;

        dir::copy(source, &path, &CopyOptions::new()).map_err(|source_err| ShiftError::CopyTree {
            from: source.to_path_buf(),
            to: path.clone(),
            source: source_err,
        })?;

        info!(snapshot = %path.display(), "source tree snapshot taken");
        Ok(Self {
            source: source.to_path_buf(),
            path,
            committed: false,
        })
    }

    /// Folder holding the copied tree
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the snapshot if the source tree is down to at most
    /// `max_residual_bytes`; keep it otherwise.
    pub fn commit(mut self, max_residual_bytes: u64) -> Result<CommitOutcome> {
        let residual_bytes = tree_size(&self.source)?;

        if residual_bytes > max_residual_bytes {
            warn!(
                snapshot = %self.path.display(),
                residual_bytes,
                "source tree not drained, keeping snapshot"
            );
            self.committed = true;
            return Ok(CommitOutcome::Retained {
                path: self.path.clone(),
                residual_bytes,
            });
        }

        fs::remove_dir_all(&self.path).map_err(io_err("remove", &self.path))?;
        self.committed = true;
        info!("snapshot discarded");
        Ok(CommitOutcome::Discarded)
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        if !self.committed {
            warn!(snapshot = %self.path.display(), "run did not finish, snapshot kept for recovery");
        }
    }
}

/// Total size in bytes of every file under `path`; zero if it is missing
pub fn tree_size(path: &Path) -> Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    let mut total = 0u64;
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(|err| ShiftError::Io {
            action: "measure",
            path: path.to_path_buf(),
            source: err.into(),
        })?;
        if entry.file_type().is_file() {
            total += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }
    Ok(total)
}
