use anyhow::{Context, Result};
use pagehost_core::{Error, SiteStore, Slug};
use serde::Serialize;

use super::{load_settings, open_store};
use crate::GlobalArgs;

#[derive(Debug, Serialize)]
struct ListEntry {
    slug: String,
    url: String,
    css_assets: usize,
    img_assets: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated: Option<String>,
}

/// Print every hosted page, sorted by slug
pub async fn run(global: &GlobalArgs, json: bool) -> Result<()> {
    let config = load_settings(global)?;
    let store = open_store(&config)?;
    let slugs = store.list().context("Failed to list pages")?;

    if !json {
        if slugs.is_empty() {
            println!("No pages in {}", store.root().display());
        }
        for slug in &slugs {
            println!("{}", slug);
        }
        return Ok(());
    }

    let entries = slugs
        .iter()
        .map(|slug| list_entry(&store, slug))
        .collect::<Result<Vec<_>>>()?;

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn list_entry(store: &SiteStore, slug: &Slug) -> Result<ListEntry> {
    // A directory without index.html is listed but has no details
    let (css_assets, img_assets, updated) = match store.get(slug.as_str()) {
        Ok(site) => (
            site.css_assets.len(),
            site.img_assets.len(),
            site.updated.map(|t| t.to_rfc3339()),
        ),
        Err(Error::NotFound(_)) => (0, 0, None),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read page '{}'", slug));
        }
    };
    Ok(ListEntry {
        url: format!("/p/{}", slug),
        slug: slug.to_string(),
        css_assets,
        img_assets,
        updated,
    })
}
