//! CLI configuration.

use aas_discovery_core::DEFAULT_SEARCH_LIMIT;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Discovery configuration.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Persistence configuration
    pub persistence: PersistenceConfig,

    /// Search configuration
    pub search: SearchConfig,
}

/// Persistence configuration.
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Database path
    pub db_path: PathBuf,
}

/// Search configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Page size when `--limit` is not given
    pub default_limit: i64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            persistence: PersistenceConfig {
                db_path: PathBuf::from("./discovery.db"),
            },
            search: SearchConfig {
                default_limit: DEFAULT_SEARCH_LIMIT,
            },
        }
    }
}

impl DiscoveryConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DISCOVERY_DB_PATH`: `SQLite` database path
    /// - `DISCOVERY_DEFAULT_LIMIT`: page size for searches without `--limit`
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(db_path) = lookup("DISCOVERY_DB_PATH") {
            config.persistence.db_path = PathBuf::from(db_path);
        }

        if let Some(limit) = lookup("DISCOVERY_DEFAULT_LIMIT") {
            let limit: i64 = limit
                .parse()
                .with_context(|| format!("Invalid DISCOVERY_DEFAULT_LIMIT '{limit}'"))?;
            if limit < 0 {
                bail!("DISCOVERY_DEFAULT_LIMIT must not be negative, got {limit}");
            }
            config.search.default_limit = limit;
        }

        Ok(config)
    }
}
