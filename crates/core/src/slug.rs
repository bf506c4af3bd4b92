use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path};
use uuid::Uuid;

/// Length of generated slugs, in lowercase hex characters
pub const GENERATED_SLUG_LEN: usize = 6;

/// Site identifier, used both as URL path segment and directory name.
///
/// A `Slug` can only be obtained through [`Slug::parse`] or
/// [`Slug::generate`], so holding one means the value is a single safe
/// path component under the store root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Validate a raw slug taken from a form field, URL segment or
    /// directory entry.
    ///
    /// On top of the rules of [`validate_file_name`], slugs may not start
    /// with `.` so hidden entries in the store root never show up as sites,
    /// and must consist of URL-unreserved characters (`A-Z a-z 0-9 . _ ~ -`)
    /// so the slug can be pasted into asset URLs as is. Surrounding
    /// whitespace is rejected, not trimmed.
    ///
    /// ```text
    /// Slug::parse("demo")       → Ok
    /// Slug::parse("a1b2c3")     → Ok
    /// Slug::parse("../etc")     → Err("Path separators not allowed...")
    /// Slug::parse("..")         → Err("Parent directory references...")
    /// Slug::parse(".trash")     → Err("Hidden names not allowed...")
    /// Slug::parse("a?b")        → Err("Only letters, digits...")
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let name = validate_component(raw, "slug")?;
        if name.starts_with('.') {
            return Err(Error::InvalidInput(format!(
                "Hidden names not allowed in 'slug': '{}'",
                raw
            )));
        }
        if !name.chars().all(is_url_safe) {
            return Err(Error::InvalidInput(format!(
                "Only letters, digits, '.', '_', '~' and '-' allowed in 'slug': '{}'",
                raw
            )));
        }
        Ok(Slug(name.to_string()))
    }

    /// Random slug of [`GENERATED_SLUG_LEN`] lowercase hex characters.
    ///
    /// Not unique on its own: callers must retry on collision.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Slug(hex[..GENERATED_SLUG_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for Slug {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '-')
}

/// Validate an asset file name before it is joined onto a site folder.
pub fn validate_file_name(raw: &str) -> Result<&str> {
    validate_component(raw, "filename")
}

/// Accept `raw` only if it is exactly one normal path component.
///
/// This is the single guard between user input and `Path::join` on the
/// store root. It rejects:
/// - Empty or whitespace-only values
/// - Path separators (`/`, `\`), NUL and other control characters
/// - `.` and `..`
/// - Anything `Path::components` does not see as one `Normal` component
fn validate_component<'a>(raw: &'a str, field_name: &str) -> Result<&'a str> {
    if raw.trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "Empty value in '{}' field",
            field_name
        )));
    }

    if raw
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(Error::InvalidInput(format!(
            "Path separators not allowed in '{}': '{}'",
            field_name,
            raw.escape_debug()
        )));
    }

    if raw == "." || raw == ".." {
        return Err(Error::InvalidInput(format!(
            "Parent directory references not allowed in '{}': '{}'",
            field_name, raw
        )));
    }

    let mut components = Path::new(raw).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(raw),
        _ => Err(Error::InvalidInput(format!(
            "'{}' must be a single path segment: '{}'",
            field_name, raw
        ))),
    }
}
