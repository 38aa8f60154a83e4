//! Moving post content between directories.
//!
//! A post's content is whatever sits under the top-level component of its
//! relative path (see [`content_root`]), plus a sibling asset directory named
//! after the file stem. The thumbnail moves as a single file to the same
//! relative path. Ingestion moves these from staging
//! into a page directory; a page split moves them from one page directory to
//! the next.
//!
//! Moves are renames. When the two directories live on different filesystems
//! the entry is copied (recursively, for directories) and the source removed.
//! An existing destination is never overwritten.

use crate::types::{Post, asset_dir, content_root, safe_relative};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
    #[error("path escapes its directory: {0}")]
    UnsafePath(String),
    #[error("failed to copy directory tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Move one file or directory, creating the destination's parent.
pub fn move_entry(from: &Path, to: &Path) -> Result<(), ContentError> {
    if to.exists() {
        return Err(ContentError::DestinationExists(to.to_path_buf()));
    }
    let wrap = |source: io::Error| ContentError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(from, to)?;
            Ok(())
        }
        Err(e) => Err(wrap(e)),
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> Result<(), ContentError> {
    let wrap = |source: io::Error| ContentError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if from.is_dir() {
        for entry in WalkDir::new(from) {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(from)
                .map_err(|_| ContentError::UnsafePath(entry.path().display().to_string()))?;
            let target = to.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target).map_err(wrap)?;
            } else {
                fs::copy(entry.path(), &target).map_err(wrap)?;
            }
        }
        fs::remove_dir_all(from).map_err(wrap)
    } else {
        fs::copy(from, to).map_err(wrap)?;
        fs::remove_file(from).map_err(wrap)
    }
}

/// The top-level entries that carry an item's content.
///
/// The primary entry comes first and is required to be a safe relative path.
/// The asset directory is included only if it exists under `base`. The
/// thumbnail is not included; see [`thumbnail_entry`].
pub fn content_entries(base: &Path, relative: &str) -> Result<Vec<PathBuf>, ContentError> {
    let primary =
        content_root(relative).ok_or_else(|| ContentError::UnsafePath(relative.to_string()))?;
    let mut entries = vec![primary];
    if let Some(assets) = asset_dir(relative)
        && base.join(&assets).is_dir()
        && !entries.contains(&assets)
    {
        entries.push(assets);
    }
    Ok(entries)
}

/// Relative path to move for a thumbnail, unless it already travels inside
/// one of the `taken` entries.
///
/// Only the thumbnail file itself moves: `thumbs/a.png` lands at
/// `thumbs/a.png` under the destination, leaving any other files in `thumbs/`
/// where they are.
pub fn thumbnail_entry(thumbnail: &str, taken: &[PathBuf]) -> Result<Option<PathBuf>, ContentError> {
    if thumbnail.is_empty() {
        return Ok(None);
    }
    let unsafe_path = || ContentError::UnsafePath(thumbnail.to_string());
    let root = content_root(thumbnail).ok_or_else(unsafe_path)?;
    if taken.contains(&root) {
        return Ok(None);
    }
    safe_relative(thumbnail).map(Some).ok_or_else(unsafe_path)
}

/// Every entry a post owns under a page directory: its content entries plus
/// the thumbnail file.
pub fn post_entries(dir: &Path, post: &Post) -> Result<Vec<PathBuf>, ContentError> {
    let mut entries = content_entries(dir, &post.path)?;
    if post.has_thumbnail()
        && let Some(thumb) = thumbnail_entry(&post.thumbnail, &entries)?
    {
        entries.push(thumb);
    }
    Ok(entries)
}

/// Move everything a post owns from one page directory to another.
///
/// Entries that are already gone from `from_dir` are skipped with a warning;
/// the post record is still moved by the caller.
pub fn relocate_post(from_dir: &Path, to_dir: &Path, post: &Post) -> Result<(), ContentError> {
    for entry in post_entries(from_dir, post)? {
        let from = from_dir.join(&entry);
        let to = to_dir.join(&entry);
        if !from.exists() {
            tracing::warn!(path = %from.display(), "post content missing, nothing to move");
            continue;
        }
        move_entry(&from, &to)?;
        tracing::debug!(from = %from.display(), to = %to.display(), "moved post content");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn post(path: &str, thumbnail: &str) -> Post {
        Post {
            path: path.into(),
            topic: "t".into(),
            thumbnail: thumbnail.into(),
        }
    }

    #[test]
    fn move_file_creates_parent() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("a.html");
        fs::write(&from, "a").unwrap();
        let to = tmp.path().join("x/y/a.html");

        move_entry(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "a");
    }

    #[test]
    fn move_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("a.html");
        let to = tmp.path().join("b.html");
        fs::write(&from, "a").unwrap();
        fs::write(&to, "b").unwrap();

        let err = move_entry(&from, &to).unwrap_err();
        assert!(matches!(err, ContentError::DestinationExists(_)));
        assert!(from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "b");
    }

    #[test]
    fn copy_fallback_moves_directory_tree() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("post");
        fs::create_dir_all(from.join("img")).unwrap();
        fs::write(from.join("index.html"), "i").unwrap();
        fs::write(from.join("img/a.png"), "p").unwrap();
        let to = tmp.path().join("dest/post");
        fs::create_dir_all(tmp.path().join("dest")).unwrap();

        copy_then_remove(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(to.join("index.html")).unwrap(), "i");
        assert_eq!(fs::read_to_string(to.join("img/a.png")).unwrap(), "p");
    }

    #[test]
    fn entries_include_existing_asset_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("post")).unwrap();

        let entries = content_entries(tmp.path(), "post.html").unwrap();
        assert_eq!(entries, vec![PathBuf::from("post.html"), PathBuf::from("post")]);

        let entries = content_entries(tmp.path(), "other.html").unwrap();
        assert_eq!(entries, vec![PathBuf::from("other.html")]);
    }

    #[test]
    fn entries_reject_escaping_paths() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            content_entries(tmp.path(), "../secret").unwrap_err(),
            ContentError::UnsafePath(_)
        ));
    }

    #[test]
    fn thumbnail_inside_post_directory_is_not_moved_twice() {
        let taken = vec![PathBuf::from("post")];
        assert_eq!(thumbnail_entry("post/thumb.png", &taken).unwrap(), None);
        assert_eq!(
            thumbnail_entry("thumb.png", &taken).unwrap(),
            Some(PathBuf::from("thumb.png"))
        );
        assert_eq!(thumbnail_entry("", &taken).unwrap(), None);
    }

    #[test]
    fn thumbnail_in_shared_directory_moves_alone() {
        let taken = vec![PathBuf::from("a.html")];
        assert_eq!(
            thumbnail_entry("thumbs/a.png", &taken).unwrap(),
            Some(PathBuf::from("thumbs/a.png"))
        );
        assert!(matches!(
            thumbnail_entry("thumbs/../../a.png", &taken).unwrap_err(),
            ContentError::UnsafePath(_)
        ));
    }

    #[test]
    fn relocate_leaves_sibling_thumbnails_behind() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("1");
        let to = tmp.path().join("2");
        fs::create_dir_all(from.join("thumbs")).unwrap();
        fs::write(from.join("a.html"), "a").unwrap();
        fs::write(from.join("b.html"), "b").unwrap();
        fs::write(from.join("thumbs/a.png"), "ta").unwrap();
        fs::write(from.join("thumbs/b.png"), "tb").unwrap();

        relocate_post(&from, &to, &post("b.html", "thumbs/b.png")).unwrap();

        assert!(to.join("thumbs/b.png").is_file());
        assert!(from.join("thumbs/a.png").is_file());
        assert!(!to.join("thumbs/a.png").exists());
    }

    #[test]
    fn relocate_moves_file_assets_and_thumbnail() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("1");
        let to = tmp.path().join("2");
        fs::create_dir_all(from.join("post")).unwrap();
        fs::write(from.join("post.html"), "p").unwrap();
        fs::write(from.join("post/a.png"), "a").unwrap();
        fs::write(from.join("thumb.png"), "t").unwrap();
        fs::write(from.join("stays.html"), "s").unwrap();

        relocate_post(&from, &to, &post("post.html", "thumb.png")).unwrap();

        assert!(to.join("post.html").is_file());
        assert!(to.join("post/a.png").is_file());
        assert!(to.join("thumb.png").is_file());
        assert!(from.join("stays.html").is_file());
        assert!(!from.join("post.html").exists());
    }

    #[test]
    fn relocate_tolerates_missing_content() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("1");
        fs::create_dir_all(&from).unwrap();
        relocate_post(&from, &tmp.path().join("2"), &post("gone.html", "")).unwrap();
    }
}
