//! First-run setup of an empty store.

use crate::catalogue::{CategoryIndex, QUEUE_TEMPLATE_FILENAME, RECORD_FILENAME, Store};
use crate::config::StoreConfig;
use crate::record::{self, RecordError};
use crate::types::{ServerManifest, StagedItem};
use std::fs;

/// A store exists once both of its roots are directories.
pub fn is_initialized(store: &Store) -> bool {
    store.staging_root().is_dir() && store.published_root().is_dir()
}

/// Create both roots, the server manifest and an empty category index.
///
/// Also drops a `template.stage.json` into staging showing the queue format.
/// Records that already exist are left alone, so re-creating a deleted root
/// never resets the catalogue.
pub fn initialize(store: &Store, config: &StoreConfig) -> Result<(), RecordError> {
    for root in [store.staging_root(), store.published_root()] {
        fs::create_dir_all(root).map_err(|e| RecordError::io(root, e))?;
    }
    tracing::info!(
        staging = %store.staging_root().display(),
        published = %store.published_root().display(),
        "initialized directories"
    );

    let template_path = store.staging_root().join(QUEUE_TEMPLATE_FILENAME);
    if !template_path.exists() {
        let template = [StagedItem {
            filename: "filename path".into(),
            thumbnail: "thumbnail path".into(),
            topic: "about the file content".into(),
            category: "posts".into(),
        }];
        record::save(&template_path, &template)?;
        tracing::info!(path = %template_path.display(), "created queue template");
    }

    if store.manifest_path().exists() {
        tracing::info!(path = %store.manifest_path().display(), "kept existing server manifest");
    } else {
        let manifest = ServerManifest {
            root: config.server.base_url.clone(),
            items_per_page: config.items_per_page(),
            published_pages: RECORD_FILENAME.to_string(),
        };
        store.save_manifest(&manifest)?;
        tracing::info!(path = %store.manifest_path().display(), "created server manifest");
    }

    if store.index_path().exists() {
        tracing::info!(path = %store.index_path().display(), "kept existing category index");
    } else {
        store.save_index(&CategoryIndex::default())?;
        tracing::info!(path = %store.index_path().display(), "created category index");
    }
    Ok(())
}
