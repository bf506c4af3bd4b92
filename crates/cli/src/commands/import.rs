use anyhow::{Context, Result};
use pagehost_core::{AssetKind, INDEX_FILE, UploadedFile};
use std::fs;
use std::path::{Path, PathBuf};

use super::{load_settings, open_store};
use crate::GlobalArgs;

/// Publish a local directory laid out like a stored site
pub async fn run(global: &GlobalArgs, path: PathBuf, slug: Option<String>) -> Result<()> {
    println!("📦 Importing {}", path.display());

    if !path.is_dir() {
        anyhow::bail!("Directory does not exist: {}", path.display());
    }

    let index_path = path.join(INDEX_FILE);
    if !index_path.is_file() {
        anyhow::bail!("{} not found in {}", INDEX_FILE, path.display());
    }
    let index = fs::read(&index_path)
        .with_context(|| format!("Failed to read {}", index_path.display()))?;

    let css_files = read_folder(&path.join(AssetKind::Css.dir_name()))?;
    let img_files = read_folder(&path.join(AssetKind::Img.dir_name()))?;

    let config = load_settings(global)?;
    let store = open_store(&config)?;
    let slug = store
        .create(slug.as_deref(), Some(index.as_slice()), &css_files, &img_files)
        .context("Failed to create page")?;

    println!("   ✓ CSS files: {}", css_files.len());
    println!("   ✓ Images: {}", img_files.len());
    println!();
    println!("✅ Published as {}", slug);
    println!("   URL: /p/{}", slug);

    Ok(())
}

/// Regular files directly inside `dir`, sorted by name; missing dir is empty
fn read_folder(dir: &Path) -> Result<Vec<UploadedFile>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let entry = entry?;
        let src_path = entry.path();
        if !src_path.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            eprintln!("   ⚠ Skipping non UTF-8 file name: {}", src_path.display());
            continue;
        };
        let data =
            fs::read(&src_path).with_context(|| format!("Failed to read {}", src_path.display()))?;
        files.push(UploadedFile::new(name, data));
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
