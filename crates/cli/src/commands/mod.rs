pub mod import;
pub mod list;
pub mod remove;
pub mod serve;

use anyhow::{Context, Result};
use pagehost_core::{Config, SiteStore, load_config};

use crate::GlobalArgs;

/// Resolve configuration: file (or defaults), then environment, then flags.
pub fn load_settings(global: &GlobalArgs) -> Result<Config> {
    let mut config = load_config(global.config.as_deref())
        .context("Failed to load configuration")?
        .with_env(|key| std::env::var(key).ok());

    if let Some(root) = &global.root {
        config.store.root = root.clone();
    }
    Ok(config)
}

/// Open the site store named by the resolved configuration.
pub fn open_store(config: &Config) -> Result<SiteStore> {
    SiteStore::open(&config.store.root).with_context(|| {
        format!(
            "Failed to open site store at {}",
            config.store.root.display()
        )
    })
}
