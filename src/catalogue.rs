//! The published tree and the staging area, as seen through a [`Store`] handle.
//!
//! ## Layout
//!
//! ```text
//! published/
//! ├── server.json              # ServerManifest
//! ├── page.json                # CategoryIndex
//! └── posts/                   # one directory per category (its path segment)
//!     ├── page.json            # CategoryChain
//!     ├── 1/
//!     │   ├── page.json        # Page 1
//!     │   └── sample1.html     # post content lives beside its page record
//!     └── 2/
//!         └── page.json
//! staging/
//! ├── stage.json               # pending queue of StagedItem
//! └── sample6.html
//! ```
//!
//! Every operation in the crate receives the store explicitly; nothing reads
//! paths from ambient configuration.

use crate::config::StoreConfig;
use crate::record::{self, RecordError};
use crate::types::{CategoryChain, CategoryEntry, Page, ServerManifest, StagedItem};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Filename of every index-like record (category index, chains, pages).
pub const RECORD_FILENAME: &str = "page.json";
pub const MANIFEST_FILENAME: &str = "server.json";
pub const QUEUE_FILENAME: &str = "stage.json";
pub const QUEUE_TEMPLATE_FILENAME: &str = "template.stage.json";

/// Handle on a store's two roots.
#[derive(Debug, Clone)]
pub struct Store {
    published: PathBuf,
    staging: PathBuf,
}

impl Store {
    pub fn new(published: impl Into<PathBuf>, staging: impl Into<PathBuf>) -> Self {
        Self {
            published: published.into(),
            staging: staging.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.server.published_dir, &config.server.staging_dir)
    }

    pub fn published_root(&self) -> &Path {
        &self.published
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.published.join(MANIFEST_FILENAME)
    }

    pub fn index_path(&self) -> PathBuf {
        self.published.join(RECORD_FILENAME)
    }

    pub fn queue_path(&self) -> PathBuf {
        self.staging.join(QUEUE_FILENAME)
    }

    pub fn category_dir(&self, segment: &str) -> PathBuf {
        self.published.join(segment)
    }

    pub fn chain_path(&self, segment: &str) -> PathBuf {
        self.category_dir(segment).join(RECORD_FILENAME)
    }

    pub fn page_dir(&self, segment: &str, number: u32) -> PathBuf {
        self.category_dir(segment).join(number.to_string())
    }

    pub fn page_path(&self, segment: &str, number: u32) -> PathBuf {
        self.page_dir(segment, number).join(RECORD_FILENAME)
    }

    pub fn page_exists(&self, segment: &str, number: u32) -> bool {
        self.page_path(segment, number).is_file()
    }

    // ------------------------------------------------------------------------
    // Manifest and index
    // ------------------------------------------------------------------------

    pub fn load_manifest(&self) -> Result<ServerManifest, RecordError> {
        record::load(&self.manifest_path())
    }

    pub fn save_manifest(&self, manifest: &ServerManifest) -> Result<(), RecordError> {
        record::save(&self.manifest_path(), manifest)
    }

    pub fn load_index(&self) -> Result<CategoryIndex, RecordError> {
        record::load(&self.index_path())
    }

    pub fn save_index(&self, index: &CategoryIndex) -> Result<(), RecordError> {
        record::save(&self.index_path(), index)
    }

    // ------------------------------------------------------------------------
    // Chains and pages
    // ------------------------------------------------------------------------

    /// Load a category's chain, rejecting chains that break the tail invariant.
    pub fn load_chain(&self, segment: &str) -> Result<CategoryChain, RecordError> {
        let path = self.chain_path(segment);
        let chain: CategoryChain = record::load(&path)?;
        chain
            .check()
            .map_err(|reason| RecordError::invalid(&path, reason))?;
        Ok(chain)
    }

    /// Like [`Store::load_chain`], but a missing chain file is `Ok(None)`.
    pub fn load_chain_optional(&self, segment: &str) -> Result<Option<CategoryChain>, RecordError> {
        if !self.chain_path(segment).exists() {
            return Ok(None);
        }
        self.load_chain(segment).map(Some)
    }

    pub fn save_chain(&self, segment: &str, chain: &CategoryChain) -> Result<(), RecordError> {
        record::save(&self.chain_path(segment), chain)
    }

    /// Load page `number`, checking it records the number it is filed under.
    pub fn load_page(&self, segment: &str, number: u32) -> Result<Page, RecordError> {
        let path = self.page_path(segment, number);
        let page: Page = record::load(&path)?;
        if page.current_page != number {
            return Err(RecordError::invalid(
                &path,
                format!(
                    "current_page {} filed under page directory {}",
                    page.current_page, number
                ),
            ));
        }
        Ok(page)
    }

    pub fn load_page_optional(&self, segment: &str, number: u32) -> Result<Option<Page>, RecordError> {
        if !self.page_exists(segment, number) {
            return Ok(None);
        }
        self.load_page(segment, number).map(Some)
    }

    pub fn save_page(&self, segment: &str, page: &Page) -> Result<(), RecordError> {
        record::save(&self.page_path(segment, page.current_page), page)
    }

    // ------------------------------------------------------------------------
    // Staging queue
    // ------------------------------------------------------------------------

    pub fn load_queue(&self) -> Result<Option<Vec<StagedItem>>, RecordError> {
        record::load_optional(&self.queue_path())
    }

    pub fn save_queue(&self, queue: &[StagedItem]) -> Result<(), RecordError> {
        record::save(&self.queue_path(), queue)
    }
}

/// Ordered list of categories, persisted as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryIndex {
    entries: Vec<CategoryEntry>,
}

impl CategoryIndex {
    pub fn new(entries: Vec<CategoryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [CategoryEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the category called `name`, ignoring case.
    ///
    /// Falls back to the path segment so `"travel-notes"` finds the category
    /// first declared as `"Travel Notes"`.
    pub fn find(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.entries
            .iter()
            .position(|e| e.name.to_lowercase() == wanted)
            .or_else(|| {
                let segment = path_segment(name);
                self.entries
                    .iter()
                    .position(|e| e.path.eq_ignore_ascii_case(&segment))
            })
    }

    pub fn get(&self, position: usize) -> Option<&CategoryEntry> {
        self.entries.get(position)
    }

    /// Append a new category and return its position.
    ///
    /// The path segment is derived from `name` and made unique against the
    /// segments already in the index.
    pub fn add(&mut self, name: &str) -> usize {
        let base = path_segment(name);
        let mut segment = base.clone();
        let mut suffix = 2;
        while self.segment_taken(&segment) {
            segment = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        self.entries.push(CategoryEntry {
            name: name.to_string(),
            path: segment,
            start_page: Some(1),
        });
        self.entries.len() - 1
    }

    fn segment_taken(&self, segment: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.path.eq_ignore_ascii_case(segment))
    }
}

/// Lower-cased, filesystem-safe directory name for a category.
///
/// - `"Posts"` → `"posts"`
/// - `"Travel Notes"` → `"travel-notes"`
/// - `"a/b"` → `"a-b"`
/// - `"..hidden"` → `"hidden"`
pub fn path_segment(name: &str) -> String {
    let lowered: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_whitespace() || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect();
    let trimmed = lowered.trim_start_matches('.');
    if trimmed.is_empty() {
        "category".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store() -> (TempDir, Store) {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path().join("published"), tmp.path().join("staging"));
        (tmp, store)
    }

    // =========================================================================
    // Path segments
    // =========================================================================

    #[test]
    fn segment_is_lower_case() {
        assert_eq!(path_segment("Posts"), "posts");
    }

    #[test]
    fn segment_replaces_separators_and_spaces() {
        assert_eq!(path_segment("Travel Notes"), "travel-notes");
        assert_eq!(path_segment("a/b\\c"), "a-b-c");
    }

    #[test]
    fn segment_never_hidden_or_empty() {
        assert_eq!(path_segment("..hidden"), "hidden");
        assert_eq!(path_segment(".."), "category");
        assert_eq!(path_segment("   "), "category");
    }

    // =========================================================================
    // CategoryIndex
    // =========================================================================

    #[test]
    fn find_ignores_case() {
        let mut index = CategoryIndex::default();
        index.add("Posts");
        assert_eq!(index.find("posts"), Some(0));
        assert_eq!(index.find("POSTS"), Some(0));
        assert_eq!(index.find("news"), None);
    }

    #[test]
    fn add_starts_at_page_one() {
        let mut index = CategoryIndex::default();
        let pos = index.add("News");
        let entry = index.get(pos).unwrap();
        assert_eq!(entry.name, "News");
        assert_eq!(entry.path, "news");
        assert_eq!(entry.start_page, Some(1));
    }

    #[test]
    fn find_falls_back_to_segment() {
        let mut index = CategoryIndex::default();
        index.add("Travel Notes");
        assert_eq!(index.find("travel-notes"), Some(0));
        assert_eq!(index.find("Travel/Notes"), Some(0));
    }

    #[test]
    fn add_keeps_segments_unique() {
        let mut index = CategoryIndex::new(vec![CategoryEntry {
            name: "Legacy".into(),
            path: "travel-notes".into(),
            start_page: Some(1),
        }]);
        let pos = index.add("Travel Notes");
        assert_eq!(index.get(pos).unwrap().path, "travel-notes-2");
    }

    #[test]
    fn index_serializes_as_array() {
        let mut index = CategoryIndex::default();
        index.add("Posts");
        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"name": "Posts", "path": "posts", "start_page": 1}])
        );
    }

    // =========================================================================
    // Store records
    // =========================================================================

    #[test]
    fn layout_paths() {
        let (_tmp, store) = store();
        let root = store.published_root();
        assert_eq!(store.index_path(), root.join("page.json"));
        assert_eq!(store.chain_path("posts"), root.join("posts/page.json"));
        assert_eq!(store.page_path("posts", 2), root.join("posts/2/page.json"));
        assert_eq!(store.queue_path(), store.staging_root().join("stage.json"));
    }

    #[test]
    fn chain_roundtrip_and_optional() {
        let (_tmp, store) = store();
        assert!(store.load_chain_optional("posts").unwrap().is_none());

        store.save_chain("posts", &CategoryChain::new("posts")).unwrap();
        let chain = store.load_chain_optional("posts").unwrap().unwrap();
        assert_eq!(chain.total_pages, 1);
    }

    #[test]
    fn inconsistent_chain_is_invalid() {
        let (_tmp, store) = store();
        let chain = CategoryChain {
            root: "posts".into(),
            start_page: 1,
            end_page: 1,
            total_pages: 2,
        };
        store.save_chain("posts", &chain).unwrap();

        let err = store.load_chain("posts").unwrap_err();
        assert!(matches!(err, RecordError::Invalid { .. }));
    }

    #[test]
    fn page_filed_under_wrong_number_is_invalid() {
        let (_tmp, store) = store();
        let path = store.page_path("posts", 2);
        record::save(&path, &Page::empty(1)).unwrap();

        let err = store.load_page("posts", 2).unwrap_err();
        assert!(matches!(err, RecordError::Invalid { .. }));
    }

    #[test]
    fn missing_queue_is_none() {
        let (_tmp, store) = store();
        assert!(store.load_queue().unwrap().is_none());
    }

    #[test]
    fn malformed_index_is_an_error() {
        let (_tmp, store) = store();
        fs::create_dir_all(store.published_root()).unwrap();
        fs::write(store.index_path(), r#"{"not": "a list"}"#).unwrap();
        assert!(matches!(
            store.load_index().unwrap_err(),
            RecordError::Malformed { .. }
        ));
    }
}
