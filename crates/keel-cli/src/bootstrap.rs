//! Process bootstrap
//!
//! Provider order: console, persistence, `--config` files in the order
//! given, then the environment layer. Later layers override settings.

use std::path::PathBuf;

use anyhow::{Context, Result};
use keel_core::console::{self, ConsoleConfigProvider};
use keel_core::{
    Aggregator, Catalog, ConfigFragment, ConflictPolicy, Container, MergedConfig, StaticProvider,
};
use keel_persistence::{PersistenceConfigProvider, DEFAULT_CONNECTION};
use serde_json::json;

/// SQLite file for the default connection
pub const SQLITE_PATH_ENV: &str = "KEEL_SQLITE_PATH";

#[derive(Debug, Clone)]
pub struct Options {
    pub config_files: Vec<PathBuf>,
    pub policy: ConflictPolicy,
}

/// Merge every provider into one configuration
pub fn aggregate(options: &Options) -> Result<MergedConfig> {
    dotenvy::dotenv().ok();

    let mut aggregator = Aggregator::new(options.policy)
        .with_provider(ConsoleConfigProvider)
        .with_provider(PersistenceConfigProvider);

    for path in &options.config_files {
        let provider = StaticProvider::from_file(path)
            .with_context(|| format!("loading configuration file {}", path.display()))?;
        aggregator = aggregator.with_provider(provider);
    }

    if let Some(provider) = env_layer() {
        aggregator = aggregator.with_provider(provider);
    }

    aggregator
        .aggregate()
        .context("merging configuration providers")
}

/// Constructors for everything the default providers register
pub fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    console::register_classes(&mut catalog);
    keel_persistence::register_classes(&mut catalog);
    catalog
}

pub fn container(options: &Options) -> Result<Container> {
    Ok(Container::new(aggregate(options)?, catalog()))
}

fn env_layer() -> Option<StaticProvider> {
    let path = std::env::var(SQLITE_PATH_ENV).ok()?;
    tracing::debug!(path = %path, "default connection from environment");

    let fragment = ConfigFragment::new().setting(
        "doctrine",
        json!({
            "connection": {
                DEFAULT_CONNECTION: {"driver": "sqlite", "path": path}
            }
        }),
    );
    Some(StaticProvider::new("environment", fragment))
}
