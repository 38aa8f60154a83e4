//! Staging ingestion: moves queued items into their category's tail page.
//!
//! Items are taken from `stage.json` in queue order. For each one the target
//! category is resolved (or created), its chain is ensured, and the item's
//! content is moved into the directory of the chain's current tail page, where
//! a post record is appended.
//!
//! Ingestion only appends. A tail page pushed past capacity stays that way
//! until [`repair`](crate::repair) runs.
//!
//! ## Queue handling
//!
//! An item leaves the queue as soon as it is fully ingested: the queue file is
//! rewritten without it right after its page is saved. Items whose source is
//! not there yet, or whose ingestion failed, stay queued for the next run.

use crate::catalogue::{CategoryIndex, Store};
use crate::content::{self, ContentError};
use crate::record::RecordError;
use crate::types::{CategoryChain, Page, Post, StagedItem};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// An item that was moved into the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedItem {
    pub filename: String,
    pub category: String,
    pub segment: String,
    pub page: u32,
    /// The declared thumbnail was missing and left out of the post.
    pub thumbnail_dropped: bool,
}

/// Why an item was left in the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    EmptyFilename,
    EmptyCategory,
    MissingSource,
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyFilename => write!(f, "no filename"),
            SkipReason::EmptyCategory => write!(f, "no category"),
            SkipReason::MissingSource => write!(f, "source not found"),
            SkipReason::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedItem {
    pub filename: String,
    pub reason: SkipReason,
}

/// Outcome of an ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// The queue file existed.
    pub queue_found: bool,
    pub ingested: Vec<IngestedItem>,
    pub skipped: Vec<SkippedItem>,
    /// Names of categories created during this run.
    pub created_categories: Vec<String>,
    /// Path segments of every category that received a post.
    pub touched: BTreeSet<String>,
}

/// Ingest every ready item of the staging queue.
///
/// Failing to read the queue or the category index is fatal. Anything going
/// wrong with an individual item is logged and leaves that item queued.
pub fn ingest_pending(store: &Store) -> Result<IngestReport, IngestError> {
    let mut report = IngestReport::default();
    let Some(queue) = store.load_queue()? else {
        tracing::warn!(path = %store.queue_path().display(), "staging queue not found");
        return Ok(report);
    };
    report.queue_found = true;

    let mut index = store.load_index()?;
    let mut remaining = queue.clone();

    for item in &queue {
        if let Some(reason) = check_ready(store, item) {
            tracing::warn!(filename = %item.filename, reason = %reason, "skipping staged item");
            report.skipped.push(SkippedItem {
                filename: item.filename.clone(),
                reason,
            });
            continue;
        }

        match ingest_item(store, &mut index, item, &mut report) {
            Ok(ingested) => {
                if let Some(pos) = remaining.iter().position(|r| r == item) {
                    remaining.remove(pos);
                }
                store.save_queue(&remaining)?;
                report.touched.insert(ingested.segment.clone());
                report.ingested.push(ingested);
            }
            Err(e) => {
                tracing::error!(filename = %item.filename, error = %e, "failed to ingest staged item");
                report.skipped.push(SkippedItem {
                    filename: item.filename.clone(),
                    reason: SkipReason::Failed(e.to_string()),
                });
            }
        }
    }

    Ok(report)
}

fn check_ready(store: &Store, item: &StagedItem) -> Option<SkipReason> {
    if item.filename.trim().is_empty() {
        return Some(SkipReason::EmptyFilename);
    }
    if item.category.trim().is_empty() {
        return Some(SkipReason::EmptyCategory);
    }
    if !store.staging_root().join(&item.filename).is_file() {
        return Some(SkipReason::MissingSource);
    }
    None
}

fn ingest_item(
    store: &Store,
    index: &mut CategoryIndex,
    item: &StagedItem,
    report: &mut IngestReport,
) -> Result<IngestedItem, IngestError> {
    let position = match index.find(&item.category) {
        Some(pos) => pos,
        None => {
            let pos = index.add(&item.category);
            let segment = index.entries()[pos].path.clone();
            let dir = store.category_dir(&segment);
            std::fs::create_dir_all(&dir).map_err(|e| RecordError::io(&dir, e))?;
            store.save_index(index)?;
            tracing::info!(category = %item.category, path = %dir.display(), "created category");
            report.created_categories.push(item.category.clone());
            pos
        }
    };
    let entry = &index.entries()[position];
    let segment = entry.path.clone();
    let category = entry.name.clone();

    let chain = match store.load_chain_optional(&segment)? {
        Some(chain) if !chain.is_empty() => chain,
        _ => {
            let chain = CategoryChain::new(&segment);
            store.save_chain(&segment, &chain)?;
            tracing::info!(category = %category, "created category chain");
            chain
        }
    };

    let tail = chain.end_page;
    let mut page = match store.load_page_optional(&segment, tail)? {
        Some(page) => page,
        None => Page::empty(tail),
    };
    let page_dir = store.page_dir(&segment, tail);
    let staging = store.staging_root();

    let entries = content::content_entries(staging, &item.filename)?;
    let mut thumbnail = String::new();
    let mut thumbnail_entry = None;
    if !item.thumbnail.is_empty() {
        if staging.join(&item.thumbnail).exists() {
            thumbnail = item.thumbnail.clone();
            thumbnail_entry = content::thumbnail_entry(&item.thumbnail, &entries)?;
        } else {
            tracing::warn!(
                thumbnail = %staging.join(&item.thumbnail).display(),
                "thumbnail not found, post recorded without it"
            );
        }
    }

    let moves: Vec<_> = entries.iter().chain(thumbnail_entry.iter()).collect();
    if let Some(clash) = moves.iter().map(|e| page_dir.join(e)).find(|to| to.exists()) {
        return Err(ContentError::DestinationExists(clash).into());
    }
    for entry in moves {
        let from = staging.join(entry);
        let to = page_dir.join(entry);
        content::move_entry(&from, &to)?;
        tracing::info!(from = %from.display(), to = %to.display(), "moved staged content");
    }

    page.posts.push(Post {
        path: item.filename.clone(),
        topic: item.topic.clone(),
        thumbnail: thumbnail.clone(),
    });
    store.save_page(&segment, &page)?;
    tracing::debug!(category = %category, page = tail, posts = page.posts.len(), "appended post");

    Ok(IngestedItem {
        filename: item.filename.clone(),
        category,
        segment,
        page: tail,
        thumbnail_dropped: !item.thumbnail.is_empty() && thumbnail.is_empty(),
    })
}
