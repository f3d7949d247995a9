//! `AppConfig` struct and TOML read/write.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Movie catalog API settings.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// User backend settings.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Document store settings (optional).
    #[serde(default)]
    pub docstore: DocStoreConfig,
}

/// Movie catalog API configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Bearer API token. `CINEDEX_CATALOG_TOKEN` takes precedence.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Base URL override.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// User backend configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of the user backend. `CINEDEX_BACKEND_URL` takes precedence.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Document store configuration.
///
/// All fields optional: without a project and database the saved-items
/// and trending features degrade instead of failing.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DocStoreConfig {
    /// Endpoint override.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Project ID.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Database ID.
    #[serde(default)]
    pub database_id: Option<String>,
    /// Collection holding search-popularity counters.
    #[serde(default)]
    pub trending_collection_id: Option<String>,
    /// Collection holding saved movies.
    #[serde(default)]
    pub saved_collection_id: Option<String>,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}
