//! Process-wide client configuration and its loading chain.
//!
//! `Config` is a passive value object: the `Client` consumes it at
//! construction and never mutates it afterward. `ConfigLoader` implements
//! the priority chain from the external-interfaces section of the
//! specification: explicit constructor fields, then `API_`-prefixed
//! environment variables, then a `.env`/`.env.{profile}` file (via
//! `dotenvy`), then a secret-file directory.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A value that never prints its contents through `Debug`/`Display`, only
/// through an explicit `reveal()` call.
///
/// Rust rendering of the redesign note for Pydantic's `SecretStr`: the
/// wrapper serializes to a fixed placeholder and only `reveal()` returns the
/// raw form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(String);

const REDACTED: &str = "********";

impl Secret {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

pub const DEFAULT_TIMEOUT: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF: f64 = 0.5;

/// Nested database connection parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret>,
    pub name: Option<String>,
    pub ssl_mode: Option<String>,
}

/// Process-wide client configuration.
///
/// Validated once at `Client` construction; never mutated by the core
/// after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub url: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret>,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: f64,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT
}
fn default_true() -> bool {
    true
}
fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_retry_backoff() -> f64 {
    DEFAULT_RETRY_BACKOFF
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
            verify_ssl: true,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            debug: false,
            database: None,
        }
    }
}

impl Config {
    /// Validate that the URL, if present, starts with `http://`/`https://`
    /// and strip its trailing slash; also rejects out-of-bounds numeric
    /// fields. Configuration errors are raised synchronously here, at
    /// construction, rather than surfacing as a runtime failure later.
    pub fn normalize(&mut self) -> Result<(), CoreError> {
        if let Some(url) = &self.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CoreError::Configuration(format!(
                    "API URL must start with http:// or https://, got {url}"
                )));
            }
            self.url = Some(url.trim_end_matches('/').to_string());
        }
        if self.timeout == 0 {
            return Err(CoreError::Configuration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if !self.retry_backoff.is_finite() || self.retry_backoff <= 0.0 {
            return Err(CoreError::Configuration(format!(
                "retry_backoff must be a positive, finite number, got {}",
                self.retry_backoff
            )));
        }
        Ok(())
    }
}

/// Abstract source of raw string key/value pairs, used by `ConfigLoader`.
///
/// Tests construct a `ConfigLoader` over an in-memory `MapSource` instead of
/// mutating process environment variables (the redesign note for
/// "monkey-patching in tests").
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads from `std::env::var`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// An in-memory source, for tests and for overlays loaded from `.env` files.
#[derive(Debug, Clone, Default)]
pub struct MapSource(pub HashMap<String, String>);

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// Loads a `Config` by threading an explicit source chain, in priority
/// order: explicit overrides, then `API_`-prefixed env vars, then a dotenv
/// overlay, then a secret-file directory.
pub struct ConfigLoader {
    prefix: String,
    sources: Vec<Box<dyn ConfigSource>>,
    secrets_dir: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: "API_".to_string(),
            sources: vec![Box::new(EnvSource)],
            secrets_dir: None,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Overlay a `.env`-shaped source *above* the process environment (i.e.
    /// consulted first). Used to implement profile overlays without
    /// touching global env state.
    #[must_use]
    pub fn with_overlay(mut self, source: MapSource) -> Self {
        self.sources.insert(0, Box::new(source));
        self
    }

    #[must_use]
    pub fn with_secrets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.secrets_dir = Some(dir.into());
        self
    }

    /// Load a dotenv file (if it exists) as an overlay, without mutating
    /// process environment variables.
    pub fn with_dotenv_file(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let Ok(iter) = dotenvy::from_path_iter(path) else {
            return self;
        };
        let mut map = HashMap::new();
        for item in iter.flatten() {
            map.insert(item.0, item.1);
        }
        self.with_overlay(MapSource(map))
    }

    fn lookup(&self, key: &str) -> Option<String> {
        for source in &self.sources {
            if let Some(v) = source.get(key) {
                return Some(v);
            }
        }
        if let Some(dir) = &self.secrets_dir {
            let path = dir.join(key);
            if let Ok(contents) = std::fs::read_to_string(path) {
                return Some(contents.trim().to_string());
            }
        }
        None
    }

    fn env_key(&self, field: &str) -> String {
        format!("{}{}", self.prefix, field.to_uppercase())
    }

    /// Resolve a `Config`, overlaying explicit `overrides` on top of values
    /// discovered through the source chain.
    pub fn load(&self, overrides: Config) -> Result<Config, CoreError> {
        let mut cfg = Config::default();

        cfg.url = overrides
            .url
            .or_else(|| self.lookup(&self.env_key("URL")));
        cfg.username = overrides
            .username
            .or_else(|| self.lookup(&self.env_key("USERNAME")));
        cfg.password = overrides.password.or_else(|| {
            self.lookup(&self.env_key("PASSWORD")).map(Secret::new)
        });
        cfg.timeout = self
            .lookup(&self.env_key("TIMEOUT"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(overrides.timeout.max(1).min(overrides.timeout));
        if overrides.timeout != DEFAULT_TIMEOUT {
            cfg.timeout = overrides.timeout;
        } else if cfg.timeout == 0 {
            cfg.timeout = DEFAULT_TIMEOUT;
        }
        cfg.verify_ssl = self
            .lookup(&self.env_key("VERIFY_SSL"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(overrides.verify_ssl);
        cfg.max_retries = self
            .lookup(&self.env_key("MAX_RETRIES"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(overrides.max_retries);
        cfg.retry_backoff = self
            .lookup(&self.env_key("RETRY_BACKOFF"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(overrides.retry_backoff);
        cfg.debug = self
            .lookup(&self.env_key("DEBUG"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(overrides.debug);

        // Nested database.* fields use a `__` delimiter, e.g. API_DATABASE__HOST.
        let db_host = self.lookup(&self.env_key("DATABASE__HOST"));
        let db_port = self
            .lookup(&self.env_key("DATABASE__PORT"))
            .and_then(|v| v.parse().ok());
        let db_user = self.lookup(&self.env_key("DATABASE__USERNAME"));
        let db_pass = self.lookup(&self.env_key("DATABASE__PASSWORD"));
        let db_name = self.lookup(&self.env_key("DATABASE__NAME"));
        let db_ssl = self.lookup(&self.env_key("DATABASE__SSL_MODE"));
        cfg.database = overrides.database.or({
            if db_host.is_some() || db_name.is_some() {
                Some(DatabaseConfig {
                    host: db_host,
                    port: db_port,
                    username: db_user,
                    password: db_pass.map(Secret::new),
                    name: db_name,
                    ssl_mode: db_ssl,
                })
            } else {
                None
            }
        });

        cfg.normalize()?;
        Ok(cfg)
    }

    /// Load a named profile by overlaying `.env.{profile}` on top of the
    /// default `.env` file and the process environment.
    pub fn load_profile(&self, profile: &str, dir: impl AsRef<Path>) -> Result<Config, CoreError> {
        let dir = dir.as_ref();
        let loader = ConfigLoader::new()
            .with_prefix(self.prefix.clone())
            .with_dotenv_file(dir.join(".env"))
            .with_dotenv_file(dir.join(format!(".env.{profile}")));
        loader.load(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_overrides_win_over_source() {
        let source = MapSource(HashMap::from([
            ("API_URL".to_string(), "https://from-source.example".to_string()),
        ]));
        let loader = ConfigLoader::new().with_overlay(source);
        let overrides = Config {
            url: Some("https://explicit.example".to_string()),
            username: Some("u".to_string()),
            password: Some(Secret::new("p")),
            ..Config::default()
        };
        let cfg = loader.load(overrides).unwrap();
        assert_eq!(cfg.url.as_deref(), Some("https://explicit.example"));
    }

    #[test]
    fn source_fills_in_missing_fields() {
        let source = MapSource(HashMap::from([
            ("API_URL".to_string(), "https://api.example/".to_string()),
            ("API_USERNAME".to_string(), "bob".to_string()),
            ("API_PASSWORD".to_string(), "secret".to_string()),
        ]));
        let loader = ConfigLoader::new().with_overlay(source);
        let cfg = loader.load(Config::default()).unwrap();
        assert_eq!(cfg.url.as_deref(), Some("https://api.example"));
        assert_eq!(cfg.username.as_deref(), Some("bob"));
        assert_eq!(cfg.password.unwrap().reveal(), "secret");
    }

    #[test]
    fn nested_database_fields_use_double_underscore() {
        let source = MapSource(HashMap::from([
            ("API_DATABASE__HOST".to_string(), "db.internal".to_string()),
            ("API_DATABASE__PORT".to_string(), "5432".to_string()),
        ]));
        let loader = ConfigLoader::new().with_overlay(source);
        let cfg = loader.load(Config::default()).unwrap();
        let db = cfg.database.unwrap();
        assert_eq!(db.host.as_deref(), Some("db.internal"));
        assert_eq!(db.port, Some(5432));
    }

    #[test]
    fn rejects_url_without_scheme() {
        let mut cfg = Config {
            url: Some("api.example.com".to_string()),
            ..Config::default()
        };
        assert!(cfg.normalize().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut cfg = Config {
            timeout: 0,
            ..Config::default()
        };
        assert!(matches!(cfg.normalize(), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn rejects_negative_retry_backoff() {
        let mut cfg = Config {
            retry_backoff: -0.5,
            ..Config::default()
        };
        assert!(matches!(cfg.normalize(), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn rejects_zero_retry_backoff() {
        let mut cfg = Config {
            retry_backoff: 0.0,
            ..Config::default()
        };
        assert!(matches!(cfg.normalize(), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn secret_never_prints_raw_value() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "********");
        assert_eq!(format!("{secret}"), "********");
        assert_eq!(secret.reveal(), "hunter2");
    }
}
