//! Shared test utilities for the folio test suite.
//!
//! [`TestStore`] wraps an initialized store in a temp directory and offers
//! seeding helpers plus accessors that panic with a clear message on failure,
//! so tests can read like a description of the catalogue's shape.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let t = TestStore::new(3);
//! t.seed_category("posts", &[3, 5]);   // page 1 holds 3 posts, tail holds 5
//! t.stage("new.html", "Posts");        // file in staging + queue entry
//!
//! assert_eq!(t.page_sizes("posts"), vec![3, 5]);
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::bootstrap;
use crate::catalogue::{CategoryIndex, Store};
use crate::config::{PageConfig, ServerConfig, StoreConfig};
use crate::types::{CategoryChain, CategoryEntry, Page, Post, StagedItem};

// =========================================================================
// Fixture setup
// =========================================================================

/// Valid config with both roots under `root`.
pub fn test_config(root: &Path, items_per_page: usize) -> StoreConfig {
    StoreConfig {
        server: ServerConfig {
            base_url: "https://example.com".into(),
            staging_dir: root.join("staging"),
            published_dir: root.join("published"),
        },
        page: PageConfig {
            items_per_page,
            repair_after_ingest: true,
        },
    }
}

/// An initialized store living in its own temp directory.
pub struct TestStore {
    pub tmp: TempDir,
    pub store: Store,
    pub config: StoreConfig,
}

impl TestStore {
    pub fn new(items_per_page: usize) -> Self {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path(), items_per_page);
        let store = Store::from_config(&config);
        bootstrap::initialize(&store, &config).unwrap();
        Self { tmp, store, config }
    }

    // =====================================================================
    // Seeding
    // =====================================================================

    /// Add a category named `segment` whose pages hold `sizes[i]` posts.
    ///
    /// Posts are `p1.html`, `p2.html`, … numbered across the whole category,
    /// each with a content file in its page directory. An empty `sizes`
    /// writes an empty chain (`total_pages == 0`).
    pub fn seed_category(&self, segment: &str, sizes: &[usize]) {
        let mut entries = self.store.load_index().unwrap().entries().to_vec();
        entries.push(CategoryEntry {
            name: segment.to_string(),
            path: segment.to_string(),
            start_page: Some(1),
        });
        self.store.save_index(&CategoryIndex::new(entries)).unwrap();

        let total = sizes.len() as u32;
        let chain = CategoryChain {
            root: segment.to_string(),
            start_page: if total == 0 { 0 } else { 1 },
            end_page: total,
            total_pages: total,
        };
        fs::create_dir_all(self.store.category_dir(segment)).unwrap();
        self.store.save_chain(segment, &chain).unwrap();

        let mut counter = 0;
        for (i, &size) in sizes.iter().enumerate() {
            let number = i as u32 + 1;
            let mut page = Page::empty(number);
            if number < total {
                page.next_page = Some(number + 1);
            }
            let dir = self.store.page_dir(segment, number);
            fs::create_dir_all(&dir).unwrap();
            for _ in 0..size {
                counter += 1;
                let path = format!("p{}.html", counter);
                fs::write(dir.join(&path), format!("post {}", counter)).unwrap();
                page.posts.push(Post {
                    path,
                    topic: format!("Post {}", counter),
                    thumbnail: String::new(),
                });
            }
            self.store.save_page(segment, &page).unwrap();
        }
    }

    /// Write `filename` into staging and queue it for `category`.
    pub fn stage(&self, filename: &str, category: &str) {
        self.write_staged(filename);
        self.push_queue(filename, "", category);
    }

    /// Queue `filename` without creating the file.
    pub fn queue_only(&self, filename: &str, category: &str) {
        self.push_queue(filename, "", category);
    }

    /// Like [`TestStore::stage`], with a thumbnail file as well.
    pub fn stage_with_thumbnail(&self, filename: &str, thumbnail: &str, category: &str) {
        self.write_staged(filename);
        self.write_staged(thumbnail);
        self.push_queue(filename, thumbnail, category);
    }

    fn write_staged(&self, relative: &str) {
        let path = self.store.staging_root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, format!("staged {}", relative)).unwrap();
    }

    fn push_queue(&self, filename: &str, thumbnail: &str, category: &str) {
        let mut queue = self.store.load_queue().unwrap().unwrap_or_default();
        queue.push(StagedItem {
            filename: filename.to_string(),
            thumbnail: thumbnail.to_string(),
            topic: format!("About {}", filename),
            category: category.to_string(),
        });
        self.store.save_queue(&queue).unwrap();
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    /// Index entry with path segment `segment`. Panics if not found.
    pub fn entry(&self, segment: &str) -> CategoryEntry {
        let index = self.store.load_index().unwrap();
        index
            .entries()
            .iter()
            .find(|e| e.path == segment)
            .cloned()
            .unwrap_or_else(|| {
                let paths: Vec<&str> = index.entries().iter().map(|e| e.path.as_str()).collect();
                panic!("category '{segment}' not in index. Available: {paths:?}")
            })
    }

    pub fn chain(&self, segment: &str) -> CategoryChain {
        self.store
            .load_chain(segment)
            .unwrap_or_else(|e| panic!("chain for '{segment}': {e}"))
    }

    pub fn page(&self, segment: &str, number: u32) -> Page {
        self.store
            .load_page(segment, number)
            .unwrap_or_else(|e| panic!("page {number} of '{segment}': {e}"))
    }

    /// Post count of every page in chain order.
    pub fn page_sizes(&self, segment: &str) -> Vec<usize> {
        let total = self.chain(segment).total_pages;
        (1..=total)
            .map(|n| self.page(segment, n).posts.len())
            .collect()
    }

    pub fn post_paths(&self, segment: &str, number: u32) -> Vec<String> {
        self.page(segment, number)
            .posts
            .into_iter()
            .map(|p| p.path)
            .collect()
    }

    /// Current queue contents; an absent queue reads as empty.
    pub fn queue(&self) -> Vec<StagedItem> {
        self.store.load_queue().unwrap().unwrap_or_default()
    }
}
