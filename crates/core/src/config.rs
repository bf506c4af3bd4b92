use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the admin password; wins over the file
pub const PASSWORD_ENV: &str = "ADMIN_PASSWORD";

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "pagehost.toml";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ROOT: &str = "sites";
const DEFAULT_PUBLIC_PREFIX: &str = "/static";
const DEFAULT_COOKIE_NAME: &str = "admin";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Path prefixes owned by the page and admin routes
const RESERVED_ROUTES: [&str; 3] = ["/p", "/admin", "/upload"];

/// Raw TOML configuration structure
/// Every section and field is optional; defaults are applied on conversion
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    store: RawStore,
    #[serde(default)]
    admin: RawAdmin,
}

#[derive(Debug, Default, Deserialize)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
    max_upload_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStore {
    root: Option<String>,
    public_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAdmin {
    password: Option<String>,
    cookie_name: Option<String>,
}

/// Complete, validated configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub admin: AdminSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Directory holding one subdirectory per site
    pub root: PathBuf,
    /// URL prefix the store root is served under, without trailing slash
    pub public_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSettings {
    pub password: Option<String>,
    pub cookie_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            store: StoreSettings {
                root: PathBuf::from(DEFAULT_ROOT),
                public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            },
            admin: AdminSettings {
                password: None,
                cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            },
        }
    }
}

impl Config {
    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    ///
    /// Only [`PASSWORD_ENV`] is consulted; an empty value is ignored.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = lookup(PASSWORD_ENV).filter(|p| !p.is_empty()) {
            self.admin.password = Some(password);
        }
        self
    }

    /// The admin password, required before the server may start.
    pub fn require_password(&self) -> Result<&str> {
        self.admin.password.as_deref().ok_or_else(|| {
            Error::ConfigParse(format!(
                "Admin password not set. Export {} or set [admin] password in {}",
                PASSWORD_ENV, DEFAULT_CONFIG_FILE
            ))
        })
    }
}

/// Load configuration.
///
/// With an explicit path the file must exist. Without one,
/// [`DEFAULT_CONFIG_FILE`] in the working directory is used if present,
/// and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => parse_config(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                parse_config(default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Parse a config file from a path
pub fn parse_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::ConfigParse(format!("Cannot read {}: {}", path.display(), e))
    })?;
    parse_config_str(&content)
}

/// Parse a config file from a string (useful for testing)
pub fn parse_config_str(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)?;
    let defaults = Config::default();

    let public_prefix = match raw.store.public_prefix {
        Some(prefix) => validate_public_prefix(&prefix)?,
        None => defaults.store.public_prefix,
    };

    let cookie_name = match raw.admin.cookie_name {
        Some(name) => validate_cookie_name(&name)?,
        None => defaults.admin.cookie_name,
    };

    let root = match raw.store.root {
        Some(root) if root.trim().is_empty() => {
            return Err(Error::ConfigParse("Empty path in 'store.root' field".to_string()));
        }
        Some(root) => PathBuf::from(root),
        None => defaults.store.root,
    };

    let max_upload_bytes = raw
        .server
        .max_upload_bytes
        .unwrap_or(defaults.server.max_upload_bytes);
    if max_upload_bytes == 0 {
        return Err(Error::ConfigParse(
            "'server.max_upload_bytes' must be greater than zero".to_string(),
        ));
    }

    Ok(Config {
        server: ServerSettings {
            host: raw.server.host.unwrap_or(defaults.server.host),
            port: raw.server.port.unwrap_or(defaults.server.port),
            max_upload_bytes,
        },
        store: StoreSettings {
            root,
            public_prefix,
        },
        admin: AdminSettings {
            password: raw.admin.password.filter(|p| !p.is_empty()),
            cookie_name,
        },
    })
}

/// Validate the URL prefix the store is mounted under.
///
/// ```text
/// "/static"   → Ok("/static")
/// "/static/"  → Ok("/static")
/// "static"    → Err("must start with '/'")
/// "/"         → Err("cannot be the site root")
/// "/admin/x"  → Err("overlaps the '/admin' routes")
/// ```
fn validate_public_prefix(prefix: &str) -> Result<String> {
    let prefix = prefix.trim();
    if !prefix.starts_with('/') {
        return Err(Error::ConfigParse(format!(
            "'store.public_prefix' must start with '/': '{}'",
            prefix
        )));
    }

    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::ConfigParse(
            "'store.public_prefix' cannot be the site root".to_string(),
        ));
    }

    if trimmed
        .chars()
        .any(|c| c.is_whitespace() || c == '?' || c == '#' || c == '{' || c == '}')
    {
        return Err(Error::ConfigParse(format!(
            "'store.public_prefix' contains characters not allowed in a path: '{}'",
            prefix
        )));
    }

    if let Some(route) = RESERVED_ROUTES
        .iter()
        .find(|route| trimmed == **route || trimmed.starts_with(&format!("{}/", route)))
    {
        return Err(Error::ConfigParse(format!(
            "'store.public_prefix' overlaps the '{}' routes: '{}'",
            route, prefix
        )));
    }

    Ok(trimmed.to_string())
}

/// Cookie names are RFC 6265 tokens; keep to a conservative subset
fn validate_cookie_name(name: &str) -> Result<String> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::ConfigParse(format!(
            "Invalid 'admin.cookie_name': '{}'",
            name
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.root, PathBuf::from("sites"));
        assert_eq!(config.store.public_prefix, "/static");
        assert_eq!(config.admin.cookie_name, "admin");
        assert!(config.admin.password.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
max_upload_bytes = 1048576

[store]
root = "/var/lib/pagehost"
public_prefix = "/files/"

[admin]
password = "hunter2"
cookie_name = "pagehost_session"
        "#;

        let config = parse_config_str(toml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.max_upload_bytes, 1_048_576);
        assert_eq!(config.store.root, PathBuf::from("/var/lib/pagehost"));
        assert_eq!(config.store.public_prefix, "/files");
        assert_eq!(config.admin.password.as_deref(), Some("hunter2"));
        assert_eq!(config.admin.cookie_name, "pagehost_session");
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        let result = parse_config_str("[server]\nport = \"eighty\"\n");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_validate_public_prefix() {
        assert_eq!(validate_public_prefix("/static").unwrap(), "/static");
        assert_eq!(validate_public_prefix("/a/b//").unwrap(), "/a/b");

        let result = validate_public_prefix("static");
        assert!(result.unwrap_err().to_string().contains("must start with '/'"));

        let result = validate_public_prefix("/");
        assert!(result.unwrap_err().to_string().contains("cannot be the site root"));

        assert!(validate_public_prefix("/has space").is_err());
        assert!(validate_public_prefix("/{wild}").is_err());
    }

    #[test]
    fn test_public_prefix_cannot_shadow_routes() {
        for prefix in ["/p", "/p/", "/p/assets", "/admin", "/admin/files", "/upload", "/upload/x"] {
            let toml = format!("[store]\npublic_prefix = \"{}\"\n", prefix);
            let result = parse_config_str(&toml);
            assert!(
                matches!(&result, Err(Error::ConfigParse(msg)) if msg.contains("overlaps")),
                "expected '{}' to be rejected, got {:?}",
                prefix,
                result
            );
        }

        assert_eq!(validate_public_prefix("/pages").unwrap(), "/pages");
        assert_eq!(validate_public_prefix("/administrivia").unwrap(), "/administrivia");
        assert_eq!(validate_public_prefix("/uploads").unwrap(), "/uploads");
    }

    #[test]
    fn test_rejects_empty_root() {
        let result = parse_config_str("[store]\nroot = \"  \"\n");
        assert!(result.unwrap_err().to_string().contains("store.root"));
    }

    #[test]
    fn test_rejects_bad_cookie_name() {
        assert!(parse_config_str("[admin]\ncookie_name = \"a;b\"\n").is_err());
        assert!(parse_config_str("[admin]\ncookie_name = \"\"\n").is_err());
    }

    #[test]
    fn test_env_password_overrides_file() {
        let config = parse_config_str("[admin]\npassword = \"from-file\"\n").unwrap();

        let overridden = config.clone().with_env(|key| {
            (key == PASSWORD_ENV).then(|| "from-env".to_string())
        });
        assert_eq!(overridden.require_password().unwrap(), "from-env");

        let unchanged = config.with_env(|_| Some(String::new()));
        assert_eq!(unchanged.require_password().unwrap(), "from-file");
    }

    #[test]
    fn test_require_password_missing() {
        let config = Config::default().with_env(|_| None);
        let err = config.require_password().unwrap_err().to_string();
        assert!(err.contains(PASSWORD_ENV));
    }

    #[test]
    fn test_empty_password_in_file_is_unset() {
        let config = parse_config_str("[admin]\npassword = \"\"\n").unwrap();
        assert!(config.require_password().is_err());
    }

    #[test]
    fn test_parse_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pagehost.toml");
        fs::write(&path, "[server]\nport = 3000\n").unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_load_config_explicit_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_config(Some(dir.path().join("absent.toml").as_path()));
        assert!(result.unwrap_err().to_string().contains("Cannot read"));
    }
}
