//! Top-level runs over a configured store.
//!
//! Every entry point validates the config, takes the [`StoreLock`] and holds it
//! until it returns. [`update`] is the full run:
//!
//! ```text
//! lock → bootstrap (new store) | repair (existing) → ingest → settle
//! ```
//!
//! The settling repair runs when `page.repair_after_ingest` is set and
//! ingestion placed at least one post, so the store is consistent on return.
//! Ingestion and repair stay separate passes; [`ingest`] and [`repair`] run
//! them one at a time.

use crate::bootstrap;
use crate::catalogue::Store;
use crate::config::{ConfigError, StoreConfig};
use crate::ingest::{self, IngestError, IngestReport};
use crate::lock::{LockError, StoreLock};
use crate::record::RecordError;
use crate::repair::{self, RepairError, RepairReport};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Repair(#[from] RepairError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("store not initialized (missing {}); run `folio init` or `folio update` first", .0.display())]
    NotInitialized(PathBuf),
}

/// What a full [`update`] did.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// The store was created by this run.
    pub initialized: bool,
    /// Repair pass over the existing catalogue, absent on first run.
    pub repair: Option<RepairReport>,
    pub ingest: IngestReport,
    /// Repair pass after ingestion, if one ran.
    pub settle: Option<RepairReport>,
}

/// Bootstrap or repair, ingest the staging queue, then settle.
pub fn update(config: &StoreConfig) -> Result<UpdateReport, PipelineError> {
    config.validate()?;
    let store = Store::from_config(config);
    let _lock = StoreLock::acquire(&store)?;
    let mut report = UpdateReport::default();

    if bootstrap::is_initialized(&store) {
        report.repair = Some(repair::repair_all(&store, config.items_per_page())?);
    } else {
        tracing::info!("store not initialized, bootstrapping");
        bootstrap::initialize(&store, config)?;
        report.initialized = true;
    }

    report.ingest = ingest::ingest_pending(&store)?;

    if config.page.repair_after_ingest && !report.ingest.ingested.is_empty() {
        report.settle = Some(repair::repair_all(&store, config.items_per_page())?);
    }
    Ok(report)
}

/// Create the store's skeleton. Returns false if it already existed.
pub fn init(config: &StoreConfig) -> Result<bool, PipelineError> {
    config.validate()?;
    let store = Store::from_config(config);
    let _lock = StoreLock::acquire(&store)?;
    if bootstrap::is_initialized(&store) {
        tracing::info!(path = %store.published_root().display(), "store already initialized");
        return Ok(false);
    }
    bootstrap::initialize(&store, config)?;
    Ok(true)
}

/// Run a single repair pass.
pub fn repair(config: &StoreConfig) -> Result<RepairReport, PipelineError> {
    let store = open(config)?;
    let _lock = StoreLock::acquire(&store)?;
    Ok(repair::repair_all(&store, config.items_per_page())?)
}

/// Run a single ingestion pass, leaving any overflow for the next repair.
pub fn ingest(config: &StoreConfig) -> Result<IngestReport, PipelineError> {
    let store = open(config)?;
    let _lock = StoreLock::acquire(&store)?;
    Ok(ingest::ingest_pending(&store)?)
}

/// Validate the config and require an initialized store.
pub fn open(config: &StoreConfig) -> Result<Store, PipelineError> {
    config.validate()?;
    let store = Store::from_config(config);
    if !bootstrap::is_initialized(&store) {
        let missing = if store.staging_root().is_dir() {
            store.published_root()
        } else {
            store.staging_root()
        };
        return Err(PipelineError::NotInitialized(missing.to_path_buf()));
    }
    Ok(store)
}
