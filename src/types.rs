//! Record schemas persisted in the store.
//!
//! Field names match the JSON keys on disk. Every record rejects unknown keys
//! so that a file of the wrong shape fails to load instead of being read
//! optimistically.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// `server.json` at the published root. Written once at bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerManifest {
    /// Public base URL the catalogue is served from.
    pub root: String,
    pub items_per_page: usize,
    /// Category index file, relative to the published root.
    pub published_pages: String,
}

/// One entry of the category index (`page.json` at the published root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryEntry {
    /// Display name as first declared by a staged item.
    pub name: String,
    /// Directory name under the published root.
    pub path: String,
    /// First page of the chain. `null` or `0` means not yet known.
    #[serde(default)]
    pub start_page: Option<u32>,
}

impl CategoryEntry {
    pub fn needs_start_page(&self) -> bool {
        matches!(self.start_page, None | Some(0))
    }
}

/// Chain metadata stored at the root of each category directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryChain {
    /// The category's path segment.
    pub root: String,
    pub start_page: u32,
    /// Page currently accepting appends. Always equals `total_pages`.
    pub end_page: u32,
    pub total_pages: u32,
}

impl CategoryChain {
    /// Chain of a freshly created category: a single, empty page 1.
    pub fn new(segment: &str) -> Self {
        Self {
            root: segment.to_string(),
            start_page: 1,
            end_page: 1,
            total_pages: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_pages == 0
    }

    /// Check `1 <= start_page <= end_page == total_pages`.
    ///
    /// An empty chain (`total_pages == 0`) is accepted; it has nothing to check.
    pub fn check(&self) -> Result<(), String> {
        if self.is_empty() {
            return Ok(());
        }
        if self.end_page != self.total_pages {
            return Err(format!(
                "end_page {} does not match total_pages {}",
                self.end_page, self.total_pages
            ));
        }
        if self.start_page < 1 || self.start_page > self.end_page {
            return Err(format!(
                "start_page {} outside 1..={}",
                self.start_page, self.end_page
            ));
        }
        Ok(())
    }
}

/// One page of a category (`<segment>/<n>/page.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Page {
    /// The page number as a string, mirroring the directory name.
    pub root: String,
    pub current_page: u32,
    pub next_page: Option<u32>,
    pub posts: Vec<Post>,
}

impl Page {
    pub fn empty(number: u32) -> Self {
        Self {
            root: number.to_string(),
            current_page: number,
            next_page: None,
            posts: Vec::new(),
        }
    }

    pub fn is_over(&self, items_per_page: usize) -> bool {
        self.posts.len() > items_per_page
    }
}

/// A published item. Paths are relative to the owning page's directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Post {
    pub path: String,
    pub topic: String,
    /// Empty when the post has no thumbnail.
    #[serde(default)]
    pub thumbnail: String,
}

impl Post {
    pub fn has_thumbnail(&self) -> bool {
        !self.thumbnail.is_empty()
    }

    /// Rewrite page-number path components after the post moved pages.
    ///
    /// Only whole components equal to `from` are replaced; a file called
    /// `sample1.html` keeps its name when moving off page 1.
    pub fn renumbered(mut self, from: u32, to: u32) -> Self {
        self.path = replace_component(&self.path, from, to);
        if self.has_thumbnail() {
            self.thumbnail = replace_component(&self.thumbnail, from, to);
        }
        self
    }
}

fn replace_component(path: &str, from: u32, to: u32) -> String {
    let from = from.to_string();
    let to = to.to_string();
    path.split('/')
        .map(|part| if part == from { to.as_str() } else { part })
        .collect::<Vec<_>>()
        .join("/")
}

/// A pending entry of the staging queue (`stage.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagedItem {
    /// Source file relative to the staging root.
    pub filename: String,
    #[serde(default)]
    pub thumbnail: String,
    pub topic: String,
    /// Category name; matched case-insensitively against the index.
    pub category: String,
}

/// Top-level path component of a page- or staging-relative path.
///
/// This is what physically moves when an item changes directory: the file
/// itself for `post.html`, the whole `post/` directory for `post/index.html`.
/// Returns `None` for paths that escape their root (`..`, absolute paths).
pub fn content_root(relative: &str) -> Option<PathBuf> {
    let mut components = Path::new(relative).components();
    match components.next()? {
        Component::Normal(first) => Some(PathBuf::from(first)),
        Component::CurDir => components.next().and_then(|c| match c {
            Component::Normal(first) => Some(PathBuf::from(first)),
            _ => None,
        }),
        _ => None,
    }
}

/// Sibling asset directory of a single-file post (`post.html` -> `post`).
pub fn asset_dir(relative: &str) -> Option<PathBuf> {
    let root = content_root(relative)?;
    if Path::new(relative).components().count() != 1 {
        return None;
    }
    let stem = root.file_stem()?;
    if stem == root.as_os_str() {
        return None;
    }
    Some(PathBuf::from(stem))
}

/// `relative` with `.` components dropped, or `None` if any component
/// would leave the root.
pub fn safe_relative(relative: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if clean.as_os_str().is_empty() { None } else { Some(clean) }
}
