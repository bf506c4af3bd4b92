pub mod config;
pub mod error;
pub mod rewrite;
pub mod slug;
pub mod store;
pub mod types;

pub use config::{Config, load_config};
pub use error::{Error, Result};
pub use rewrite::rewrite;
pub use slug::{Slug, validate_file_name};
pub use store::SiteStore;
pub use types::*;
