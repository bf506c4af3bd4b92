use anyhow::{Context, Result};

use super::{load_settings, open_store};
use crate::GlobalArgs;

/// Delete a page. Removing a page that does not exist succeeds.
pub async fn run(global: &GlobalArgs, slug: String) -> Result<()> {
    let config = load_settings(global)?;
    let store = open_store(&config)?;

    let existed = store.exists(&slug)?;
    store
        .delete(&slug)
        .with_context(|| format!("Failed to delete '{}'", slug))?;

    if existed {
        println!("✓ Deleted {}", slug);
    } else {
        println!("Nothing to delete: {} does not exist", slug);
    }
    Ok(())
}
