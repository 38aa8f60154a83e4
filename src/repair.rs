//! Pagination repair: restores the page-capacity invariant.
//!
//! New posts are only ever appended to a category's tail page, so the tail is
//! the only page that can overflow. Repair walks each chain from page 1 and
//! splits any page holding more than `items_per_page` posts: the first
//! `items_per_page` posts stay, the rest move (content and records) to a new
//! page `n + 1`, which becomes the tail. A batch larger than two pages is
//! handled by the same walk, since the freshly created tail is visited next.
//!
//! ```text
//! before (capacity 3)              after
//! 1: [a b c d e f g]  tail         1: [a b c] -> 2
//!                                  2: [d e f] -> 3
//!                                  3: [g]        tail
//! ```
//!
//! Each split persists page `n`, then page `n + 1`, then the chain. The files
//! are written individually; a crash between them can leave the chain behind
//! its pages, which the next run's audit reports.
//!
//! Running repair over a consistent chain changes nothing.

use crate::catalogue::Store;
use crate::content::{self, ContentError};
use crate::record::RecordError;
use crate::types::{CategoryChain, CategoryEntry, Page};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepairError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(
        "category {category}: page {page} overflows but is not the tail (page {next} already exists)"
    )]
    SplitCollision {
        category: String,
        page: u32,
        next: u32,
    },
    #[error("items_per_page must be positive")]
    ZeroCapacity,
}

/// One page split performed by repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub page: u32,
    pub new_page: u32,
    /// Posts moved onto `new_page`.
    pub moved: usize,
}

/// Outcome of repairing a single category.
#[derive(Debug, Default)]
pub struct CategoryRepair {
    /// The index entry was changed (start page back-filled) and must be saved.
    pub index_updated: bool,
    pub splits: Vec<Split>,
}

/// Per-category result inside a [`RepairReport`].
#[derive(Debug)]
pub struct CategoryOutcome {
    pub name: String,
    pub segment: String,
    pub result: Result<CategoryRepair, RepairError>,
}

/// Outcome of a repair pass over the whole catalogue.
#[derive(Debug, Default)]
pub struct RepairReport {
    pub categories: Vec<CategoryOutcome>,
    pub index_saved: bool,
}

impl RepairReport {
    pub fn split_count(&self) -> usize {
        self.categories
            .iter()
            .filter_map(|c| c.result.as_ref().ok())
            .map(|r| r.splits.len())
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&CategoryOutcome, &RepairError)> {
        self.categories
            .iter()
            .filter_map(|c| c.result.as_ref().err().map(|e| (c, e)))
    }
}

/// Repair one category's page chain.
///
/// `entry` is the category's index entry; its start page is back-filled from
/// the chain when unset, in which case `index_updated` is true and the caller
/// must persist the index.
pub fn repair_category(
    store: &Store,
    entry: &mut CategoryEntry,
    items_per_page: usize,
) -> Result<CategoryRepair, RepairError> {
    if items_per_page == 0 {
        return Err(RepairError::ZeroCapacity);
    }
    let segment = entry.path.clone();
    let mut outcome = CategoryRepair::default();

    let Some(mut chain) = store.load_chain_optional(&segment)? else {
        tracing::debug!(category = %entry.name, "no chain metadata, nothing to repair");
        return Ok(outcome);
    };

    if entry.needs_start_page() {
        entry.start_page = Some(chain.start_page);
        outcome.index_updated = true;
        tracing::info!(
            category = %entry.name,
            start_page = chain.start_page,
            "back-filled start page"
        );
    }

    if chain.is_empty() {
        return Ok(outcome);
    }

    let mut number = 1;
    while number <= chain.total_pages {
        let page = store.load_page(&segment, number)?;
        if page.is_over(items_per_page) {
            tracing::warn!(
                category = %entry.name,
                page = number,
                posts = page.posts.len(),
                capacity = items_per_page,
                "page exceeds capacity"
            );
            let split = split_page(store, &entry.name, &segment, &mut chain, page, items_per_page)?;
            outcome.splits.push(split);
        }
        number += 1;
    }

    Ok(outcome)
}

/// Move the posts beyond `items_per_page` on the tail page to a new tail.
fn split_page(
    store: &Store,
    name: &str,
    segment: &str,
    chain: &mut CategoryChain,
    mut page: Page,
    items_per_page: usize,
) -> Result<Split, RepairError> {
    let number = page.current_page;
    let new_number = number + 1;
    if number != chain.total_pages || store.page_exists(segment, new_number) {
        return Err(RepairError::SplitCollision {
            category: name.to_string(),
            page: number,
            next: new_number,
        });
    }

    let from_dir = store.page_dir(segment, number);
    let to_dir = store.page_dir(segment, new_number);
    let mut new_page = Page::empty(new_number);

    let overflow = page.posts.split_off(items_per_page);
    for post in &overflow {
        for entry in content::post_entries(&from_dir, post)? {
            let to = to_dir.join(&entry);
            if from_dir.join(&entry).exists() && to.exists() {
                return Err(ContentError::DestinationExists(to).into());
            }
        }
    }

    let moved = overflow.len();
    for post in overflow {
        content::relocate_post(&from_dir, &to_dir, &post)?;
        new_page.posts.push(post.renumbered(number, new_number));
    }

    if new_number > 1 {
        page.next_page = Some(new_number);
    }
    chain.total_pages = new_number;
    chain.end_page = new_number;

    store.save_page(segment, &page)?;
    store.save_page(segment, &new_page)?;
    store.save_chain(segment, chain)?;

    tracing::info!(
        category = %name,
        page = number,
        new_page = new_number,
        moved,
        "split page"
    );
    Ok(Split {
        page: number,
        new_page: new_number,
        moved,
    })
}

/// Repair every category in the index.
///
/// A category that fails is reported and skipped; the others are still
/// repaired. The index is saved once, at the end, if any entry changed.
pub fn repair_all(store: &Store, items_per_page: usize) -> Result<RepairReport, RepairError> {
    if items_per_page == 0 {
        return Err(RepairError::ZeroCapacity);
    }
    let mut index = store.load_index()?;
    let mut report = RepairReport::default();
    let mut index_dirty = false;

    for entry in index.entries_mut() {
        let result = repair_category(store, entry, items_per_page);
        match &result {
            Ok(repair) => index_dirty |= repair.index_updated,
            Err(e) => tracing::error!(category = %entry.name, error = %e, "repair aborted"),
        }
        report.categories.push(CategoryOutcome {
            name: entry.name.clone(),
            segment: entry.path.clone(),
            result,
        });
    }

    if index_dirty {
        store.save_index(&index)?;
        report.index_saved = true;
        tracing::info!(path = %store.index_path().display(), "updated category index");
    }
    Ok(report)
}
