//! CLI output formatting for every run.
//!
//! Output is **category-centric**: each category leads with its name, with the
//! path segment and page details shown as indented context lines. Logging
//! (via `tracing`) goes to stderr; these reports are what a user reads on
//! stdout.
//!
//! # Output Format
//!
//! ## Update
//!
//! ```text
//! Repair
//! Posts (posts)
//!     page 1 → 2: moved 2 posts
//!
//! Ingest
//! sample1.html → Posts page 2
//! later.html skipped: source not found
//! Created categories: Posts
//!
//! Ingested 1, skipped 1, 1 split
//! ```
//!
//! ## Check
//!
//! ```text
//! Posts (posts): 3 pages, 7 posts
//!     ok
//! News (news): 1 page, 4 posts
//!     tail holds 4 posts, pending repair
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::check::CategoryAudit;
use crate::ingest::IngestReport;
use crate::pipeline::UpdateReport;
use crate::repair::RepairReport;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// `Posts (posts)`, or just `posts` when name and segment agree.
fn category_header(name: &str, segment: &str) -> String {
    if name == segment {
        name.to_string()
    } else {
        format!("{} ({})", name, segment)
    }
}

// ============================================================================
// Repair
// ============================================================================

/// Format a repair pass: one block per category that changed or failed.
pub fn format_repair_report(report: &RepairReport) -> Vec<String> {
    let mut lines = Vec::new();
    for outcome in &report.categories {
        match &outcome.result {
            Ok(repair) if repair.splits.is_empty() && !repair.index_updated => {}
            Ok(repair) => {
                lines.push(category_header(&outcome.name, &outcome.segment));
                if repair.index_updated {
                    lines.push(format!("{}start page back-filled", indent(1)));
                }
                for split in &repair.splits {
                    lines.push(format!(
                        "{}page {} → {}: moved {}",
                        indent(1),
                        split.page,
                        split.new_page,
                        plural(split.moved, "post")
                    ));
                }
            }
            Err(e) => {
                lines.push(category_header(&outcome.name, &outcome.segment));
                lines.push(format!("{}FAILED: {}", indent(1), e));
            }
        }
    }
    if lines.is_empty() {
        lines.push("All categories consistent".to_string());
    }
    lines
}

pub fn print_repair_report(report: &RepairReport) {
    for line in format_repair_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Ingest
// ============================================================================

/// Format an ingestion pass: placed items, then skipped ones.
pub fn format_ingest_report(report: &IngestReport) -> Vec<String> {
    if !report.queue_found {
        return vec!["No staging queue".to_string()];
    }
    let mut lines = Vec::new();
    for item in &report.ingested {
        lines.push(format!(
            "{} → {} page {}",
            item.filename, item.category, item.page
        ));
        if item.thumbnail_dropped {
            lines.push(format!("{}thumbnail missing, dropped", indent(1)));
        }
    }
    for item in &report.skipped {
        let name = if item.filename.is_empty() {
            "(unnamed)"
        } else {
            item.filename.as_str()
        };
        lines.push(format!("{} skipped: {}", name, item.reason));
    }
    if !report.created_categories.is_empty() {
        lines.push(format!(
            "Created categories: {}",
            report.created_categories.join(", ")
        ));
    }
    if lines.is_empty() {
        lines.push("Staging queue empty".to_string());
    }
    lines
}

pub fn print_ingest_report(report: &IngestReport) {
    for line in format_ingest_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Update
// ============================================================================

/// Format a full update run, section by section, with a closing summary.
pub fn format_update_report(report: &UpdateReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.initialized {
        lines.push("Initialized new store".to_string());
        lines.push(String::new());
    }
    if let Some(repair) = &report.repair {
        lines.push("Repair".to_string());
        lines.extend(format_repair_report(repair));
        lines.push(String::new());
    }
    lines.push("Ingest".to_string());
    lines.extend(format_ingest_report(&report.ingest));
    lines.push(String::new());
    if let Some(settle) = &report.settle {
        lines.push("Settle".to_string());
        lines.extend(format_repair_report(settle));
        lines.push(String::new());
    }

    let splits: usize = report
        .repair
        .iter()
        .chain(report.settle.iter())
        .map(|r| r.split_count())
        .sum();
    let failures: usize = report
        .repair
        .iter()
        .chain(report.settle.iter())
        .map(|r| r.failures().count())
        .sum();
    let mut summary = format!(
        "Ingested {}, skipped {}, {}",
        report.ingest.ingested.len(),
        report.ingest.skipped.len(),
        plural(splits, "split")
    );
    match failures {
        0 => {}
        1 => summary.push_str(", 1 category failed"),
        n => summary.push_str(&format!(", {} categories failed", n)),
    }
    lines.push(summary);
    lines
}

pub fn print_update_report(report: &UpdateReport) {
    for line in format_update_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format an audit: a header per category and one line per issue.
pub fn format_audit(audits: &[CategoryAudit]) -> Vec<String> {
    if audits.is_empty() {
        return vec!["No categories".to_string()];
    }
    let mut lines = Vec::new();
    for audit in audits {
        lines.push(format!(
            "{}: {}, {}",
            category_header(&audit.name, &audit.segment),
            plural(audit.total_pages as usize, "page"),
            plural(audit.post_count, "post")
        ));
        if audit.issues.is_empty() {
            lines.push(format!("{}ok", indent(1)));
        }
        for issue in &audit.issues {
            lines.push(format!("{}{}", indent(1), issue));
        }
    }
    lines
}

pub fn print_audit(audits: &[CategoryAudit]) {
    for line in format_audit(audits) {
        println!("{}", line);
    }
}
