//! Advisory locks on sidecar files, shared between processes.
//!
//! Every process opening the same snapshot (the daemon and one-shot
//! operator commands) coordinates through these locks.

use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An exclusive lock on a file, released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Wait until the exclusive lock on `path` is free, then take it.
    pub async fn acquire(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        tokio::task::spawn_blocking(move || {
            let file = open_lock_file(&path)?;
            file.lock_exclusive()?;
            debug!(path = %path.display(), "Lock acquired");
            Ok(Self { file, path })
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("lock task failed: {e}")))?
    }

    /// Take the exclusive lock on `path` unless another holder has it.
    pub fn try_acquire(path: impl Into<PathBuf>) -> StoreResult<Option<Self>> {
        let path = path.into();
        let file = open_lock_file(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %e, "Unlock failed");
        }
    }
}

/// `path` with `suffix` appended to its file name (`a.json` -> `a.json.lock`).
pub fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn open_lock_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
}
