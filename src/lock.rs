//! Store-wide single-writer lock.
//!
//! Every mutating run holds an exclusive advisory lock on `<published>.lock`,
//! a file beside the published root (the root itself may not exist yet when
//! bootstrap runs). The lock file records the holder's pid for diagnostics.
//! The lock is released when the [`StoreLock`] is dropped.

use crate::catalogue::Store;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("store is locked by another run ({}, holder pid: {holder})", path.display())]
    Held { path: PathBuf, holder: String },
    #[error("failed to lock {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exclusive lock on a store, held for the lifetime of the value.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Take the store's lock without waiting.
    pub fn acquire(store: &Store) -> Result<Self, LockError> {
        let path = lock_path(store.published_root());
        let wrap = |source: io::Error| LockError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(wrap)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(wrap)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                let holder = std::fs::read_to_string(&path)
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "unknown".to_string());
                return Err(LockError::Held { path, holder });
            }
            return Err(wrap(e));
        }

        file.set_len(0)
            .and_then(|_| write!(file, "{}", std::process::id()))
            .and_then(|_| file.flush())
            .map_err(wrap)?;
        tracing::debug!(path = %path.display(), "acquired store lock");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release store lock");
        }
    }
}

/// `published` → `published.lock`, in the same parent directory.
pub fn lock_path(published_root: &Path) -> PathBuf {
    let mut name = published_root
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "store".into());
    name.push(".lock");
    published_root.with_file_name(name)
}
