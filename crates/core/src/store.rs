//! Filesystem-backed site storage.
//!
//! Layout under the store root:
//!
//! ```text
//! {root}/{slug}/index.html
//! {root}/{slug}/css/*
//! {root}/{slug}/imgs/*
//! ```
//!
//! Every operation takes the slug as a raw string and runs it through
//! [`Slug::parse`] before touching the filesystem. There is no locking:
//! concurrent writers to the same slug interleave at the filesystem level
//! and readers may observe a partially written site.

use crate::error::{Error, Result};
use crate::slug::{Slug, validate_file_name};
use crate::types::{AssetKind, INDEX_FILE, Site, UploadedFile};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Attempts at drawing an unused generated slug before giving up
const MAX_SLUG_ATTEMPTS: usize = 32;

/// Owns the directory tree under the store root
#[derive(Debug, Clone)]
pub struct SiteStore {
    root: PathBuf,
}

impl SiteStore {
    /// Store rooted at `root`. The directory is created on first write.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `root`, creating the directory if needed.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root)?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn site_dir(&self, slug: &Slug) -> PathBuf {
        self.root.join(slug)
    }

    /// Create a new site and return its slug.
    ///
    /// With no slug (or a blank one) a fresh one is generated, retrying on
    /// collision. A supplied slug is trimmed and validated; an existing
    /// site under it is a `Conflict` and stays untouched. Missing index
    /// content is `InvalidInput` and nothing is written.
    pub fn create(
        &self,
        slug: Option<&str>,
        index_content: Option<&[u8]>,
        css_files: &[UploadedFile],
        img_files: &[UploadedFile],
    ) -> Result<Slug> {
        let index_content = index_content
            .ok_or_else(|| Error::InvalidInput("index.html is required".to_string()))?;

        // Reject bad names before anything lands on disk
        check_file_names(css_files)?;
        check_file_names(img_files)?;

        fs::create_dir_all(&self.root)?;

        let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let slug = Slug::parse(raw)?;
                self.claim(&slug)?;
                slug
            }
            None => self.claim_generated()?,
        };

        let site_dir = self.site_dir(&slug);
        for kind in AssetKind::ALL {
            fs::create_dir_all(site_dir.join(kind.dir_name()))?;
        }
        fs::write(site_dir.join(INDEX_FILE), index_content)?;
        write_files(&site_dir.join(AssetKind::Css.dir_name()), css_files)?;
        write_files(&site_dir.join(AssetKind::Img.dir_name()), img_files)?;

        Ok(slug)
    }

    /// Atomically take ownership of the slug directory.
    fn claim(&self, slug: &Slug) -> Result<()> {
        match fs::create_dir(self.site_dir(slug)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Err(Error::Conflict(format!(
                "Slug '{}' already exists. Choose a different slug.",
                slug
            ))),
            Err(err) => Err(err.into()),
        }
    }

    fn claim_generated(&self) -> Result<Slug> {
        self.claim_generated_with(Slug::generate)
    }

    /// Claim the first unused slug drawn from `next`, giving up after
    /// [`MAX_SLUG_ATTEMPTS`] draws.
    fn claim_generated_with(&self, mut next: impl FnMut() -> Slug) -> Result<Slug> {
        for _ in 0..MAX_SLUG_ATTEMPTS {
            let slug = next();
            match self.claim(&slug) {
                Ok(()) => return Ok(slug),
                Err(Error::Conflict(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::Conflict(format!(
            "Could not allocate an unused slug after {} attempts",
            MAX_SLUG_ATTEMPTS
        )))
    }

    /// Read a site's markup and asset listings.
    pub fn get(&self, slug: &str) -> Result<Site> {
        let slug = Slug::parse(slug)?;
        let site_dir = self.site_dir(&slug);
        let index_path = site_dir.join(INDEX_FILE);

        let bytes = match fs::read(&index_path) {
            Ok(bytes) => bytes,
            Err(err) if is_missing(&err) => return Err(not_found(&slug)),
            Err(err) => return Err(err.into()),
        };

        let updated = fs::metadata(&index_path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        Ok(Site {
            css_assets: list_files(&site_dir.join(AssetKind::Css.dir_name()))?,
            img_assets: list_files(&site_dir.join(AssetKind::Img.dir_name()))?,
            index_content: String::from_utf8_lossy(&bytes).into_owned(),
            slug,
            updated,
        })
    }

    /// Whether a site with an `index.html` exists under `slug`.
    pub fn exists(&self, slug: &str) -> Result<bool> {
        let slug = Slug::parse(slug)?;
        Ok(self.site_dir(&slug).join(INDEX_FILE).is_file())
    }

    /// All slugs in the store, sorted. Reads the directory on every call.
    pub fn list(&self) -> Result<Vec<Slug>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut slugs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            // Skip names that could never have been created as slugs
            if let Some(slug) = entry.file_name().to_str().and_then(|n| Slug::parse(n).ok()) {
                slugs.push(slug);
            }
        }
        slugs.sort();
        Ok(slugs)
    }

    /// Replace the page markup of an existing site.
    pub fn update_content(&self, slug: &str, index_content: &[u8]) -> Result<()> {
        let site_dir = self.require_site(slug)?;
        fs::write(site_dir.join(INDEX_FILE), index_content)?;
        Ok(())
    }

    /// Write assets into an existing site, overwriting files of the same
    /// name and creating missing asset folders.
    pub fn add_assets(
        &self,
        slug: &str,
        css_files: &[UploadedFile],
        img_files: &[UploadedFile],
    ) -> Result<()> {
        let site_dir = self.require_site(slug)?;
        check_file_names(css_files)?;
        check_file_names(img_files)?;

        for (kind, files) in [(AssetKind::Css, css_files), (AssetKind::Img, img_files)] {
            let dir = site_dir.join(kind.dir_name());
            fs::create_dir_all(&dir)?;
            write_files(&dir, files)?;
        }
        Ok(())
    }

    /// Remove one asset. Missing files (or sites) are not an error.
    pub fn delete_asset(&self, slug: &str, kind: AssetKind, filename: &str) -> Result<()> {
        let slug = Slug::parse(slug)?;
        let filename = validate_file_name(filename)?;
        let target = self.site_dir(&slug).join(kind.dir_name()).join(filename);

        match fs::remove_file(&target) {
            Ok(()) => Ok(()),
            Err(err) if is_missing(&err) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a whole site. Deleting a missing site is not an error.
    ///
    /// The directory is first renamed to a hidden tombstone, so a site is
    /// either fully visible or gone; the tombstone is then removed.
    pub fn delete(&self, slug: &str) -> Result<()> {
        let slug = Slug::parse(slug)?;
        let site_dir = self.site_dir(&slug);
        if !site_dir.is_dir() {
            return Ok(());
        }

        let tombstone = self
            .root
            .join(format!(".deleting-{}-{}", slug, Uuid::new_v4().simple()));
        match fs::rename(&site_dir, &tombstone) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        }
        fs::remove_dir_all(&tombstone)?;
        Ok(())
    }

    fn require_site(&self, slug: &str) -> Result<PathBuf> {
        let slug = Slug::parse(slug)?;
        let site_dir = self.site_dir(&slug);
        if site_dir.join(INDEX_FILE).is_file() {
            Ok(site_dir)
        } else {
            Err(not_found(&slug))
        }
    }
}

fn not_found(slug: &Slug) -> Error {
    Error::NotFound(format!("site '{}'", slug))
}

/// `NotFound`, or `NotADirectory` when a path component is a plain file
fn is_missing(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

fn check_file_names(files: &[UploadedFile]) -> Result<()> {
    for file in files {
        validate_file_name(&file.name)?;
    }
    Ok(())
}

fn write_files(dir: &Path, files: &[UploadedFile]) -> Result<()> {
    for file in files {
        let name = validate_file_name(&file.name)?;
        fs::write(dir.join(name), &file.data)?;
    }
    Ok(())
}

/// Sorted names of regular files in `dir`; a missing folder is empty.
fn list_files(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if is_missing(&err) => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file()
            && let Some(name) = entry.file_name().to_str()
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    /// Store rooted in a subdirectory so tests can plant files beside it
    fn test_store() -> (TempDir, SiteStore) {
        let dir = TempDir::new().unwrap();
        let store = SiteStore::open(dir.path().join("sites")).unwrap();
        (dir, store)
    }

    fn css(name: &str, body: &str) -> UploadedFile {
        UploadedFile::new(name, body.as_bytes())
    }

    fn img(name: &str) -> UploadedFile {
        UploadedFile::new(name, b"\x89PNG fake".to_vec())
    }

    #[test]
    fn test_create_then_get() {
        let (_dir, store) = test_store();
        let slug = store
            .create(
                Some("demo"),
                Some(b"<h1>Hello</h1>"),
                &[css("site.css", "body {}")],
                &[img("logo.png"), img("a.png")],
            )
            .unwrap();
        assert_eq!(slug.as_str(), "demo");

        let site = store.get("demo").unwrap();
        assert_eq!(site.index_content, "<h1>Hello</h1>");
        assert_eq!(site.css_assets, vec!["site.css"]);
        assert_eq!(site.img_assets, vec!["a.png", "logo.png"]);
        assert!(site.updated.is_some());

        let root = store.root();
        assert!(root.join("demo/index.html").is_file());
        assert_eq!(
            fs::read_to_string(root.join("demo/css/site.css")).unwrap(),
            "body {}"
        );
        assert!(root.join("demo/imgs/logo.png").is_file());
    }

    #[test]
    fn test_create_materializes_empty_asset_dirs() {
        let (_dir, store) = test_store();
        store.create(Some("bare"), Some(b"x"), &[], &[]).unwrap();
        assert!(store.root().join("bare/css").is_dir());
        assert!(store.root().join("bare/imgs").is_dir());
    }

    #[test]
    fn test_create_trims_custom_slug() {
        let (_dir, store) = test_store();
        let slug = store.create(Some("  spaced  "), Some(b"x"), &[], &[]).unwrap();
        assert_eq!(slug.as_str(), "spaced");
    }

    #[test]
    fn test_create_conflict_leaves_existing_site() {
        let (_dir, store) = test_store();
        store
            .create(Some("taken"), Some(b"original"), &[css("a.css", "a")], &[])
            .unwrap();

        let result = store.create(Some("taken"), Some(b"replacement"), &[], &[img("b.png")]);
        assert!(matches!(result, Err(Error::Conflict(_))));

        let site = store.get("taken").unwrap();
        assert_eq!(site.index_content, "original");
        assert_eq!(site.css_assets, vec!["a.css"]);
        assert!(site.img_assets.is_empty());
    }

    #[test]
    fn test_create_requires_index() {
        let (_dir, store) = test_store();
        let result = store.create(Some("noindex"), None, &[], &[]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(!store.root().join("noindex").exists());
    }

    #[test]
    fn test_create_rejects_bad_asset_name_before_writing() {
        let (_dir, store) = test_store();
        let result = store.create(Some("evil"), Some(b"x"), &[css("../escape.css", "x")], &[]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(!store.root().join("evil").exists());
        assert!(!store.root().join("escape.css").exists());
    }

    #[test]
    fn test_create_generated_slugs_are_distinct() {
        let (_dir, store) = test_store();
        let mut seen = HashSet::new();
        for _ in 0..300 {
            let slug = store.create(None, Some(b"x"), &[], &[]).unwrap();
            assert!(seen.insert(slug), "generated slug returned twice");
        }
        assert_eq!(store.list().unwrap().len(), 300);
    }

    #[test]
    fn test_create_blank_slug_generates() {
        let (_dir, store) = test_store();
        let slug = store.create(Some("   "), Some(b"x"), &[], &[]).unwrap();
        assert_eq!(slug.as_str().len(), crate::slug::GENERATED_SLUG_LEN);
    }

    #[test]
    fn test_generated_slug_retries_on_collision() {
        let (_dir, store) = test_store();
        store.create(Some("aaaaaa"), Some(b"first"), &[], &[]).unwrap();

        let mut draws = vec!["bbbbbb", "aaaaaa"];
        let slug = store
            .claim_generated_with(|| Slug::parse(draws.pop().unwrap()).unwrap())
            .unwrap();

        assert_eq!(slug.as_str(), "bbbbbb");
        assert!(draws.is_empty());
        assert!(store.root().join("bbbbbb").is_dir());
        assert_eq!(store.get("aaaaaa").unwrap().index_content, "first");
    }

    #[test]
    fn test_generated_slug_gives_up_after_bounded_attempts() {
        let (_dir, store) = test_store();
        store.create(Some("aaaaaa"), Some(b"first"), &[], &[]).unwrap();

        let mut attempts = 0;
        let result = store.claim_generated_with(|| {
            attempts += 1;
            Slug::parse("aaaaaa").unwrap()
        });

        assert!(matches!(&result, Err(Error::Conflict(msg)) if msg.contains("Could not allocate")));
        assert_eq!(attempts, MAX_SLUG_ATTEMPTS);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_traversal_slugs_never_escape_root() {
        let (dir, store) = test_store();
        let sentinel = dir.path().join("sentinel");
        fs::create_dir(&sentinel).unwrap();
        fs::write(sentinel.join("index.html"), "outside").unwrap();

        for raw in ["../sentinel", "..", "/sentinel", "sub/../../sentinel", "..\\sentinel"] {
            assert!(store.create(Some(raw), Some(b"pwned"), &[], &[]).is_err());
            assert!(matches!(store.get(raw), Err(Error::InvalidInput(_))));
            assert!(store.update_content(raw, b"pwned").is_err());
            assert!(store.add_assets(raw, &[css("x.css", "x")], &[]).is_err());
            assert!(store.delete_asset(raw, AssetKind::Css, "x.css").is_err());
            assert!(store.delete(raw).is_err());
        }

        assert_eq!(
            fs::read_to_string(sentinel.join("index.html")).unwrap(),
            "outside"
        );
        assert!(!sentinel.join("css").exists());
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (_dir, store) = test_store();
        assert!(matches!(store.get("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_get_dir_without_index_is_not_found() {
        let (_dir, store) = test_store();
        fs::create_dir_all(store.root().join("husk/css")).unwrap();
        assert!(matches!(store.get("husk"), Err(Error::NotFound(_))));
        assert!(matches!(
            store.update_content("husk", b"x"),
            Err(Error::NotFound(_))
        ));
        assert!(!store.exists("husk").unwrap());
    }

    #[test]
    fn test_list_sorted_dirs_only() {
        let (_dir, store) = test_store();
        for slug in ["zeta", "alpha", "mid"] {
            store.create(Some(slug), Some(b"x"), &[], &[]).unwrap();
        }
        fs::write(store.root().join("stray.txt"), "x").unwrap();
        fs::create_dir(store.root().join(".deleting-old")).unwrap();

        let slugs: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(slugs, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = SiteStore::new(dir.path().join("not-yet"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_update_content() {
        let (_dir, store) = test_store();
        store.create(Some("page"), Some(b"v1"), &[], &[]).unwrap();
        store.update_content("page", b"v2").unwrap();
        assert_eq!(store.get("page").unwrap().index_content, "v2");

        assert!(matches!(
            store.update_content("missing", b"v2"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_add_assets_overwrites_and_recreates_dirs() {
        let (_dir, store) = test_store();
        store
            .create(Some("page"), Some(b"x"), &[css("a.css", "old")], &[])
            .unwrap();
        fs::remove_dir_all(store.root().join("page/imgs")).unwrap();

        store
            .add_assets("page", &[css("a.css", "new"), css("b.css", "b")], &[img("c.png")])
            .unwrap();

        let site = store.get("page").unwrap();
        assert_eq!(site.css_assets, vec!["a.css", "b.css"]);
        assert_eq!(site.img_assets, vec!["c.png"]);
        assert_eq!(
            fs::read_to_string(store.root().join("page/css/a.css")).unwrap(),
            "new"
        );
    }

    #[test]
    fn test_add_assets_missing_site() {
        let (_dir, store) = test_store();
        let result = store.add_assets("ghost", &[css("a.css", "x")], &[]);
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(!store.root().join("ghost").exists());
    }

    #[test]
    fn test_delete_asset_is_idempotent() {
        let (_dir, store) = test_store();
        store
            .create(Some("page"), Some(b"x"), &[css("a.css", "a")], &[img("b.png")])
            .unwrap();

        store.delete_asset("page", AssetKind::Css, "a.css").unwrap();
        store.delete_asset("page", AssetKind::Css, "a.css").unwrap();
        store
            .delete_asset("page", AssetKind::Css, "missing.css")
            .unwrap();
        store.delete_asset("ghost", AssetKind::Img, "b.png").unwrap();

        let site = store.get("page").unwrap();
        assert!(site.css_assets.is_empty());
        assert_eq!(site.img_assets, vec!["b.png"]);
    }

    #[test]
    fn test_delete_asset_respects_kind() {
        let (_dir, store) = test_store();
        store
            .create(Some("page"), Some(b"x"), &[css("same", "a")], &[img("same")])
            .unwrap();
        store.delete_asset("page", AssetKind::Img, "same").unwrap();

        let site = store.get("page").unwrap();
        assert_eq!(site.css_assets, vec!["same"]);
        assert!(site.img_assets.is_empty());
    }

    #[test]
    fn test_delete_asset_rejects_traversal_filename() {
        let (_dir, store) = test_store();
        store.create(Some("page"), Some(b"x"), &[], &[]).unwrap();
        let result = store.delete_asset("page", AssetKind::Css, "../index.html");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(store.root().join("page/index.html").is_file());
    }

    #[test]
    fn test_delete_site() {
        let (_dir, store) = test_store();
        store
            .create(Some("page"), Some(b"x"), &[css("a.css", "a")], &[])
            .unwrap();

        store.delete("page").unwrap();
        assert!(!store.root().join("page").exists());
        assert!(matches!(store.get("page"), Err(Error::NotFound(_))));

        // No tombstones left behind
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
    }

    #[test]
    fn test_delete_missing_site_is_ok() {
        let (_dir, store) = test_store();
        store.delete("never-existed").unwrap();
    }

    #[test]
    fn test_slug_reusable_after_delete() {
        let (_dir, store) = test_store();
        store.create(Some("again"), Some(b"one"), &[], &[]).unwrap();
        store.delete("again").unwrap();
        store.create(Some("again"), Some(b"two"), &[], &[]).unwrap();
        assert_eq!(store.get("again").unwrap().index_content, "two");
    }
}
