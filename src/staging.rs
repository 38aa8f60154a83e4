//! Producing staged items.
//!
//! The catalogue only consumes `stage.json`; these helpers are the simple
//! producers that feed it: [`fill_queue`] queues the HTML files dropped into
//! staging, using their markup for the topic, and [`generate_samples`] writes
//! throwaway HTML posts to try a store out.

use crate::catalogue::Store;
use crate::record::RecordError;
use crate::types::StagedItem;
use scraper::{Html, Selector};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Metadata read from an HTML document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HtmlMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub heading: Option<String>,
}

impl HtmlMetadata {
    /// Best available topic: description, then heading, then title.
    pub fn topic(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.heading.as_deref())
            .or(self.title.as_deref())
    }
}

/// Pull `<title>`, `<meta name="description">` and the first `<h1>` out of a
/// document. Text is entity-decoded and nested markup inside the title or
/// heading contributes only its text.
pub fn extract_metadata(html: &str) -> HtmlMetadata {
    let doc = Html::parse_document(html);
    HtmlMetadata {
        title: first_text(&doc, "title"),
        description: meta_description(&doc),
        heading: first_text(&doc, "h1"),
    }
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = doc.select(&selector).next()?;
    let text = collapse_whitespace(&element.text().collect::<String>());
    if text.is_empty() { None } else { Some(text) }
}

fn meta_description(doc: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name]").ok()?;
    doc.select(&selector)
        .find(|meta| {
            meta.value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|c| !c.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Queue every top-level `.html` file in staging that is not queued yet.
///
/// Existing queue entries are kept in place; new ones are appended in
/// filename order with `category`. Returns the newly queued items.
pub fn fill_queue(store: &Store, category: &str) -> Result<Vec<StagedItem>, StagingError> {
    let staging = store.staging_root();
    let mut queue = store.load_queue()?.unwrap_or_default();

    let entries = fs::read_dir(staging).map_err(|source| StagingError::Io {
        path: staging.to_path_buf(),
        source,
    })?;
    let mut html_files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                tracing::warn!(dir = %staging.display(), error = %e, "unreadable staging entry");
                continue;
            }
        };
        let is_html = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("html"));
        if is_html && path.is_file() {
            html_files.push(path);
        }
    }
    html_files.sort();

    let mut added = Vec::new();
    for path in html_files {
        let Some(filename) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if queue.iter().any(|q| q.filename == filename) {
            continue;
        }
        let html = match fs::read_to_string(&path) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "could not read staged file");
                continue;
            }
        };
        let metadata = extract_metadata(&html);
        let topic = metadata
            .topic()
            .map(str::to_string)
            .unwrap_or_else(|| stem(&path));
        let item = StagedItem {
            filename,
            thumbnail: String::new(),
            topic,
            category: category.to_string(),
        };
        tracing::info!(filename = %item.filename, topic = %item.topic, "queued staged file");
        queue.push(item.clone());
        added.push(item);
    }

    if !added.is_empty() {
        store.save_queue(&queue)?;
    }
    Ok(added)
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Write `count` sample posts named `sample1.html` … into `dir`.
pub fn generate_samples(dir: &Path, count: usize) -> Result<Vec<PathBuf>, StagingError> {
    let wrap = |path: &Path, source| StagingError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(|e| wrap(dir, e))?;
    let mut written = Vec::with_capacity(count);
    for i in 1..=count {
        let path = dir.join(format!("sample{}.html", i));
        let html = format!(
            "<html><head><title>Sample {i} Title</title>\
             <meta name=\"description\" content=\"Sample {i} description\"></head>\
             <body><h1>Sample {i} Post Name</h1><p>Sample {i} Content</p></body></html>\n"
        );
        fs::write(&path, html).map_err(|e| wrap(&path, e))?;
        tracing::debug!(path = %path.display(), "generated sample");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn extracts_all_fields() {
        let html = r#"<html><head><TITLE>The Title</TITLE>
            <meta name="description" content="About   things"></head>
            <body><h1>The <em>Heading</em></h1><h1>Second</h1></body></html>"#;
        let m = extract_metadata(html);
        assert_eq!(m.title.as_deref(), Some("The Title"));
        assert_eq!(m.description.as_deref(), Some("About things"));
        assert_eq!(m.heading.as_deref(), Some("The Heading"));
        assert_eq!(m.topic(), Some("About things"));
    }

    #[test]
    fn heading_tag_is_matched_exactly() {
        let html = "<header>nav</header><h10>x</h10><h1 class=\"t\">Real</h1>";
        assert_eq!(extract_metadata(html).heading.as_deref(), Some("Real"));
    }

    #[test]
    fn entities_and_unquoted_attributes() {
        let html = r#"<title>Tom &amp; Jerry</title><meta name=description content="Plain"><h1>Caf&eacute;</h1>"#;
        let m = extract_metadata(html);
        assert_eq!(m.title.as_deref(), Some("Tom & Jerry"));
        assert_eq!(m.description.as_deref(), Some("Plain"));
        assert_eq!(m.heading.as_deref(), Some("Café"));
    }

    #[test]
    fn other_meta_tags_are_ignored() {
        let html = r#"<meta charset="utf-8"><meta name="author" content="Someone">"#;
        assert_eq!(extract_metadata(html).description, None);
    }

    #[test]
    fn single_quoted_meta_attributes() {
        let html = "<meta name='Description' content='Quoted'>";
        assert_eq!(extract_metadata(html).description.as_deref(), Some("Quoted"));
    }

    #[test]
    fn topic_falls_back_to_heading_then_title() {
        let m = extract_metadata("<title>T</title><h1>H</h1>");
        assert_eq!(m.topic(), Some("H"));
        let m = extract_metadata("<title>T</title>");
        assert_eq!(m.topic(), Some("T"));
        assert_eq!(extract_metadata("<p>nothing</p>").topic(), None);
    }

    #[test]
    fn fill_queue_adds_new_html_files_once() {
        let t = TestStore::new(3);
        let staging = t.store.staging_root();
        generate_samples(staging, 2).unwrap();
        fs::write(staging.join("notes.txt"), "skip me").unwrap();

        let added = fill_queue(&t.store, "posts").unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0].filename, "sample1.html");
        assert_eq!(added[0].topic, "Sample 1 description");
        assert_eq!(added[0].category, "posts");

        let again = fill_queue(&t.store, "posts").unwrap();
        assert!(again.is_empty());
        assert_eq!(t.queue().len(), 2);
    }

    #[test]
    fn fill_queue_keeps_existing_entries() {
        let t = TestStore::new(3);
        t.queue_only("later.html", "News");
        generate_samples(t.store.staging_root(), 1).unwrap();

        fill_queue(&t.store, "posts").unwrap();
        let queue = t.queue();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].filename, "later.html");
        assert_eq!(queue[1].filename, "sample1.html");
    }

    #[test]
    fn untitled_file_uses_stem() {
        let t = TestStore::new(3);
        fs::write(t.store.staging_root().join("bare.html"), "<p>hi</p>").unwrap();

        let added = fill_queue(&t.store, "posts").unwrap();
        assert_eq!(added[0].topic, "bare");
    }

    #[test]
    fn generate_samples_writes_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let written = generate_samples(&tmp.path().join("new"), 3).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written.iter().all(|p| p.is_file()));
        assert!(written[2].ends_with("sample3.html"));
    }
}
