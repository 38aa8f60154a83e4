//! # Folio
//!
//! A filesystem-backed content catalogue. Posts are grouped into categories,
//! and each category is a forward-linked chain of capacity-bounded pages:
//!
//! ```text
//! published/posts/1/page.json  → 2/page.json  → 3/page.json (tail)
//!               [a b c]          [d e f]         [g]
//! ```
//!
//! Every structure lives in plain JSON files next to the content it describes,
//! so the published tree can be served as-is by any static file server.
//!
//! # Architecture: Two Passes
//!
//! New content arrives through a staging directory and its `stage.json` queue.
//! A run is built from two independent passes:
//!
//! ```text
//! 1. Ingest   stage.json  →  tail page of each category   (append only)
//! 2. Repair   each chain  →  split overflowing tail pages (rebalance)
//! ```
//!
//! Ingestion never splits, so it stays simple and cheap; repair restores the
//! capacity invariant afterwards. [`pipeline::update`] sequences them under a
//! store-wide lock: repair what earlier runs left, ingest, then settle.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`record`] | Typed load/save of JSON records; each file written atomically |
//! | [`types`] | Record schemas: manifest, index entries, chains, pages, posts, staged items |
//! | [`catalogue`] | The [`Store`](catalogue::Store) handle, on-disk layout, category index |
//! | [`content`] | Moving post content (files, asset directories, thumbnails) between directories |
//! | [`repair`] | Splits pages over capacity and keeps chains linked |
//! | [`ingest`] | Moves queued items into their category's tail page |
//! | [`bootstrap`] | First-run creation of an empty store |
//! | [`check`] | Read-only audit of every chain |
//! | [`lock`] | Exclusive lock held by each mutating run |
//! | [`staging`] | Filling the queue from staged HTML; sample content |
//! | [`pipeline`] | Locked entry points: update, init, repair, ingest |
//! | [`config`] | `config.toml` loading and validation |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Store Handle
//!
//! Every operation takes a [`Store`](catalogue::Store) naming its two roots.
//! Nothing reads paths from globals, so tests run against temp directories
//! and several stores can coexist in one process.
//!
//! ## Absent Is Not Malformed
//!
//! A missing record and an unreadable one are different errors
//! ([`record::RecordError`]). Repair skips a category without a chain, but a
//! corrupt chain aborts that category instead of being treated as empty.
//!
//! ## Per-File Atomicity Only
//!
//! Records are written to a temp file and renamed into place, so a reader
//! never sees half a page. A split still writes three files in sequence; a
//! crash between them is caught by [`check`] on the next run.

pub mod bootstrap;
pub mod catalogue;
pub mod check;
pub mod config;
pub mod content;
pub mod ingest;
pub mod lock;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod repair;
pub mod staging;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
