//! Typed JSON record files.
//!
//! Every structured file in the store (manifest, category index, chains,
//! pages, the staging queue) goes through this module. Records are always
//! read and written whole.
//!
//! ## Absent vs. malformed
//!
//! [`load`] never hands back a default. A missing file is
//! [`RecordError::NotFound`]; a file that exists but does not parse into the
//! expected shape is [`RecordError::Malformed`]. Callers that want a default
//! for a record that does not exist yet use [`load_optional`], which checks for
//! the file first and still fails on malformed content.
//!
//! ## Writes
//!
//! [`save`] writes the pretty-printed record to a temporary file in the target
//! directory and renames it over the destination, so a reader sees either the
//! old record or the new one. Updates spanning several files (a page split
//! writes three) are not atomic as a whole.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("record not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("malformed record {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid record {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RecordError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecordError::NotFound(_))
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        RecordError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid(path: &Path, reason: impl Into<String>) -> Self {
        RecordError::Invalid {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Load and parse a record.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, RecordError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(RecordError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(RecordError::io(path, e)),
    };
    serde_json::from_str(&content).map_err(|source| RecordError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a record that may legitimately not exist yet.
///
/// Returns `Ok(None)` only when the file is absent.
pub fn load_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, RecordError> {
    if !path.exists() {
        return Ok(None);
    }
    load(path).map(Some)
}

/// Write a record, replacing any previous content.
pub fn save<T: Serialize + ?Sized>(path: &Path, record: &T) -> Result<(), RecordError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| RecordError::io(parent, e))?;

    let mut json = serde_json::to_string_pretty(record).map_err(|source| {
        RecordError::Malformed {
            path: path.to_path_buf(),
            source,
        }
    })?;
    json.push('\n');

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| RecordError::io(parent, e))?;
    tmp.write_all(json.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| RecordError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| RecordError::io(path, e.error))?;
    Ok(())
}
