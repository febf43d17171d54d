//! Subcommand implementations.

pub mod config;
pub mod container;
pub mod kill;
pub mod list;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use portwatch_core::{Config, ConfigStore, DefaultEngine, RangeQuery, ScanContext};

use crate::ViewArgs;

/// Open the config store at `path`, or at the default location.
pub fn store(path: Option<&Path>) -> Result<ConfigStore> {
    match path {
        Some(path) => Ok(ConfigStore::with_path(path.to_path_buf())),
        None => ConfigStore::new().context("Failed to locate configuration"),
    }
}

pub async fn load_config(path: Option<&Path>) -> Result<Config> {
    let store = store(path)?;
    store
        .load()
        .await
        .with_context(|| format!("Failed to load {}", store.path().display()))
}

/// Engine over the real backends for this invocation.
pub async fn engine(config: &Config) -> Arc<DefaultEngine> {
    let ctx = ScanContext::shared(config);
    Arc::new(DefaultEngine::from_context(&ctx).await)
}

impl ViewArgs {
    /// Query for these flags, falling back to the configured range.
    pub fn query(&self, config: &Config) -> RangeQuery {
        let defaults = config.default_query();
        RangeQuery::new(
            self.from.unwrap_or(defaults.start),
            self.to.unwrap_or(defaults.end),
        )
        .with_only_used(self.used)
        .with_only_container(self.containers)
    }

    pub fn search(&self) -> &str {
        self.filter.as_deref().unwrap_or_default()
    }
}
