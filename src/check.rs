//! Read-only audit of the published tree.
//!
//! Reports every place where the catalogue breaks its structural invariants
//! without changing anything. A tail page over capacity is reported as
//! pending repair rather than as damage: ingestion legitimately leaves it that
//! way until the next repair pass.

use crate::catalogue::Store;
use crate::record::RecordError;
use crate::types::CategoryEntry;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
    /// The index entry has no start page yet.
    StartPageUnset,
    MissingChain,
    UnreadableChain(String),
    MissingPage(u32),
    UnreadablePage(u32, String),
    /// A page before the tail holds more posts than allowed.
    OverCapacity { page: u32, posts: usize },
    /// The tail holds more posts than allowed; the next repair will split it.
    TailPendingRepair { posts: usize },
    BrokenLink {
        page: u32,
        expected: Option<u32>,
        found: Option<u32>,
    },
    /// A page directory exists past the chain's tail.
    StrayPage(u32),
}

impl Issue {
    /// Issues that repair resolves by itself.
    pub fn is_pending(&self) -> bool {
        matches!(self, Issue::StartPageUnset | Issue::TailPendingRepair { .. })
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::StartPageUnset => write!(f, "start page not set in index"),
            Issue::MissingChain => write!(f, "chain metadata missing"),
            Issue::UnreadableChain(e) => write!(f, "chain metadata unreadable: {}", e),
            Issue::MissingPage(n) => write!(f, "page {} missing", n),
            Issue::UnreadablePage(n, e) => write!(f, "page {} unreadable: {}", n, e),
            Issue::OverCapacity { page, posts } => {
                write!(f, "page {} holds {} posts, over capacity", page, posts)
            }
            Issue::TailPendingRepair { posts } => {
                write!(f, "tail holds {} posts, pending repair", posts)
            }
            Issue::BrokenLink {
                page,
                expected,
                found,
            } => write!(
                f,
                "page {} links to {}, expected {}",
                page,
                link_label(*found),
                link_label(*expected)
            ),
            Issue::StrayPage(n) => write!(f, "page {} exists beyond the tail", n),
        }
    }
}

fn link_label(link: Option<u32>) -> String {
    link.map(|n| n.to_string()).unwrap_or_else(|| "nothing".into())
}

/// Audit result for one category.
#[derive(Debug, Clone)]
pub struct CategoryAudit {
    pub name: String,
    pub segment: String,
    pub total_pages: u32,
    pub post_count: usize,
    pub issues: Vec<Issue>,
}

impl CategoryAudit {
    pub fn is_consistent(&self) -> bool {
        self.issues.iter().all(Issue::is_pending)
    }
}

/// Audit every category in the index.
///
/// Only an unreadable index is an error; everything else is reported.
pub fn audit(store: &Store, items_per_page: usize) -> Result<Vec<CategoryAudit>, RecordError> {
    let index = store.load_index()?;
    Ok(index
        .entries()
        .iter()
        .map(|entry| audit_category(store, entry, items_per_page))
        .collect())
}

pub fn audit_category(store: &Store, entry: &CategoryEntry, items_per_page: usize) -> CategoryAudit {
    let mut audit = CategoryAudit {
        name: entry.name.clone(),
        segment: entry.path.clone(),
        total_pages: 0,
        post_count: 0,
        issues: Vec::new(),
    };
    if entry.needs_start_page() {
        audit.issues.push(Issue::StartPageUnset);
    }

    let chain = match store.load_chain(&entry.path) {
        Ok(chain) => chain,
        Err(RecordError::NotFound(_)) => {
            audit.issues.push(Issue::MissingChain);
            return audit;
        }
        Err(e) => {
            audit.issues.push(Issue::UnreadableChain(e.to_string()));
            return audit;
        }
    };
    audit.total_pages = chain.total_pages;

    for number in 1..=chain.total_pages {
        let page = match store.load_page(&entry.path, number) {
            Ok(page) => page,
            Err(RecordError::NotFound(_)) => {
                audit.issues.push(Issue::MissingPage(number));
                continue;
            }
            Err(e) => {
                audit.issues.push(Issue::UnreadablePage(number, e.to_string()));
                continue;
            }
        };
        audit.post_count += page.posts.len();

        let is_tail = number == chain.total_pages;
        if page.is_over(items_per_page) {
            audit.issues.push(if is_tail {
                Issue::TailPendingRepair {
                    posts: page.posts.len(),
                }
            } else {
                Issue::OverCapacity {
                    page: number,
                    posts: page.posts.len(),
                }
            });
        }

        let expected = if is_tail { None } else { Some(number + 1) };
        if page.next_page != expected {
            audit.issues.push(Issue::BrokenLink {
                page: number,
                expected,
                found: page.next_page,
            });
        }
    }

    if store.page_exists(&entry.path, chain.total_pages + 1) {
        audit.issues.push(Issue::StrayPage(chain.total_pages + 1));
    }
    audit
}
