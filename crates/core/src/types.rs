use crate::error::{Error, Result};
use crate::slug::Slug;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File name of the page markup inside every site directory
pub const INDEX_FILE: &str = "index.html";

/// The two asset folders a site owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Css,
    Img,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::Css, AssetKind::Img];

    /// Directory name under the site root (`css` or `imgs`)
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetKind::Css => "css",
            AssetKind::Img => "imgs",
        }
    }
}

impl FromStr for AssetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "css" => Ok(AssetKind::Css),
            "img" | "imgs" => Ok(AssetKind::Img),
            other => Err(Error::InvalidInput(format!(
                "Unknown asset kind '{}', expected 'css' or 'img'",
                other
            ))),
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Css => f.write_str("css"),
            AssetKind::Img => f.write_str("img"),
        }
    }
}

/// A named file received from an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// A hosted page with its asset listings, as currently stored on disk
#[derive(Debug, Clone, Serialize)]
pub struct Site {
    pub slug: Slug,
    pub index_content: String,
    /// Sorted file names in `css/`
    pub css_assets: Vec<String>,
    /// Sorted file names in `imgs/`
    pub img_assets: Vec<String>,
    /// Modification time of `index.html`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Site {
    pub fn assets(&self, kind: AssetKind) -> &[String] {
        match kind {
            AssetKind::Css => &self.css_assets,
            AssetKind::Img => &self.img_assets,
        }
    }
}
