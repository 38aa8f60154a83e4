//! Store configuration.
//!
//! Loaded from a single `config.toml`. Unlike most settings files every server
//! option is required: a store cannot be located without them, so a missing
//! value aborts before the store is touched.
//!
//! ```toml
//! [server]
//! base_url = "https://example.com"
//! staging_dir = "staging"       # relative paths resolve against the cwd
//! published_dir = "published"
//!
//! [page]
//! items_per_page = 10           # page capacity, must be positive
//! repair_after_ingest = true    # settle overflow before `update` returns
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing configuration: {0}")]
    Missing(&'static str),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub server: ServerConfig,
    pub page: PageConfig,
}

/// Where the store lives and how it is served.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Public base URL, recorded in `server.json`.
    pub base_url: String,
    /// Root of the staging area.
    pub staging_dir: PathBuf,
    /// Root of the published catalogue.
    pub published_dir: PathBuf,
}

/// Pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Maximum number of posts on any page but the tail.
    pub items_per_page: usize,
    /// Run a repair pass after ingestion within `update`.
    pub repair_after_ingest: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            items_per_page: 0,
            repair_after_ingest: true,
        }
    }
}

impl StoreConfig {
    /// Check every required option is present and in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("server.base_url"));
        }
        if self.server.staging_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing("server.staging_dir"));
        }
        if self.server.published_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing("server.published_dir"));
        }
        if self.page.items_per_page == 0 {
            return Err(ConfigError::Validation(
                "page.items_per_page must be a positive integer".into(),
            ));
        }
        if self.server.staging_dir == self.server.published_dir {
            return Err(ConfigError::Validation(
                "server.staging_dir and server.published_dir must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn items_per_page(&self) -> usize {
        self.page.items_per_page
    }
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<StoreConfig, ConfigError> {
    let config: StoreConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<StoreConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# Every [server] option is required. Relative paths resolve against the
# directory folio is run from.

[server]
# Public base URL of the published catalogue. Recorded in server.json.
base_url = "https://example.com"

# Holding area for submitted content. stage.json lists pending items.
staging_dir = "staging"

# Root of the published catalogue (categories, pages, posts).
published_dir = "published"

# ---------------------------------------------------------------------------
# Pagination
# ---------------------------------------------------------------------------
[page]
# Maximum posts per page. Overflowing pages are split on the next repair.
items_per_page = 10

# Repair categories again after ingesting, so `folio update` leaves every
# page within capacity. Set to false to defer splitting to the next run.
repair_after_ingest = true
"##
}
