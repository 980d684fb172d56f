//! Configuration Management
//!
//! This module handles loading and saving named connection profiles.
//!
//! # Configuration Locations
//! - Local: `.contact-book/config.json` (per working directory)
//! - Global: `~/.config/contact-book/connections.json` (per user)
//!
//! Both files share one format:
//! ```json
//! {
//!   "connections": {
//!     "home": { "engine": "postgres", "host": "localhost", "port": 5432,
//!               "user": "postgres", "database": "contact", "password_env": "PGPASSWORD" },
//!     "laptop": { "engine": "sqlite", "file": "/home/me/contacts.db" }
//!   },
//!   "default": "home"
//! }
//! ```
//!
//! # Resolution Precedence
//! 1. Explicit connection parameters on the command line (highest priority)
//! 2. Local config file
//! 3. Global config file
//!
//! Local profiles override global profiles with the same name, and a local
//! default wins over a global one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::{
    ConnectionConfig, DatabaseType, DEFAULT_PG_DATABASE, DEFAULT_PG_HOST, DEFAULT_PG_PORT,
    DEFAULT_PG_USER,
};
use crate::error::{ContactError, Result};

const LOCAL_DIR: &str = ".contact-book";
const LOCAL_FILE: &str = "config.json";
const GLOBAL_DIR: &str = "contact-book";
const GLOBAL_FILE: &str = "connections.json";

/// Contents of one config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Named connection profiles
    #[serde(default)]
    pub connections: BTreeMap<String, StoredConnection>,

    /// Name of the default profile (must exist in `connections`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ConfigFile {
    /// Overlay `local` on top of `self` (local wins on name clashes and default)
    #[must_use]
    pub fn merged_with(mut self, local: Self) -> Self {
        for (name, conn) in local.connections {
            self.connections.insert(name, conn);
        }
        if local.default.is_some() {
            self.default = local.default;
        }
        self
    }

    /// Resolve a profile by name, or the default profile when `name` is `None`
    pub fn resolve(&self, name: Option<&str>) -> Result<ConnectionConfig> {
        let conn_name = match name {
            Some(n) => n.to_string(),
            None => self.default.clone().ok_or_else(|| {
                let available: Vec<_> = self.connections.keys().collect();
                ContactError::config_error(format!(
                    "No default connection set. Available connections: {available:?}. \
                     Pass --connection or connection flags."
                ))
            })?,
        };

        let stored = self.connections.get(&conn_name).ok_or_else(|| {
            let available: Vec<_> = self.connections.keys().collect();
            ContactError::config_error(format!(
                "Connection '{conn_name}' not found. Available connections: {available:?}"
            ))
        })?;

        stored.resolve()
    }
}

/// Stored connection profile
///
/// Same fields as `ConnectionConfig`, plus an optional environment variable
/// that holds the password so it never has to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConnection {
    /// Connection configuration
    #[serde(flatten)]
    pub config: ConnectionConfig,

    /// Environment variable name for password (if not storing password directly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl StoredConnection {
    #[must_use]
    pub const fn new(config: ConnectionConfig) -> Self {
        Self { config, password_env: None }
    }

    /// Resolve environment variables and return a `ConnectionConfig`
    pub fn resolve(&self) -> Result<ConnectionConfig> {
        let mut config = self.config.clone();

        if let Some(env_var) = &self.password_env {
            match std::env::var(env_var) {
                Ok(password) => config.password = Some(password),
                Err(_) => {
                    return Err(ContactError::config_error(format!(
                        "Environment variable {env_var} not found for password"
                    )));
                }
            }
        }

        Ok(config)
    }
}

/// Connection parameters given explicitly (command-line flags)
///
/// Every field left `None` falls back to the base profile, then to the
/// `PostgreSQL` defaults (`localhost:5432`, user `postgres`, database `contact`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    pub engine: Option<DatabaseType>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub database: Option<String>,
    pub file: Option<PathBuf>,
}

impl ConnectionOverrides {
    /// Layer these flags over `base`
    ///
    /// The engine comes from the flag, else the base profile, else `SQLite` when a
    /// file was given and `PostgreSQL` otherwise. A base profile for a different
    /// engine contributes nothing.
    pub fn apply(&self, base: Option<ConnectionConfig>) -> Result<ConnectionConfig> {
        let engine = self
            .engine
            .or_else(|| base.as_ref().map(|b| b.engine))
            .unwrap_or(if self.file.is_some() { DatabaseType::SQLite } else { DatabaseType::Postgres });
        let base = base.filter(|b| b.engine == engine);

        match engine {
            DatabaseType::Postgres => {
                let base = base.unwrap_or_else(|| {
                    ConnectionConfig::postgres(
                        DEFAULT_PG_HOST.to_string(),
                        DEFAULT_PG_PORT,
                        DEFAULT_PG_USER.to_string(),
                        None,
                        DEFAULT_PG_DATABASE.to_string(),
                    )
                });
                Ok(ConnectionConfig::postgres(
                    pick(&self.host, base.host, DEFAULT_PG_HOST),
                    self.port.or(base.port).unwrap_or(DEFAULT_PG_PORT),
                    pick(&self.user, base.user, DEFAULT_PG_USER),
                    base.password,
                    pick(&self.database, base.database, DEFAULT_PG_DATABASE),
                ))
            }
            DatabaseType::SQLite => {
                let file = self.file.clone().or_else(|| base.and_then(|b| b.file)).ok_or_else(|| {
                    ContactError::config_error("SQLite requires a database file (--file)")
                })?;
                Ok(ConnectionConfig::sqlite(file))
            }
        }
    }
}

fn pick(flag: &Option<String>, base: Option<String>, default: &str) -> String {
    flag.clone().or(base).unwrap_or_else(|| default.to_string())
}

/// Configuration file location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLocation {
    /// `.contact-book/config.json` in the current directory
    Local,
    /// `~/.config/contact-book/connections.json`
    Global,
}

/// Get path to local config file (`.contact-book/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        ContactError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(LOCAL_DIR).join(LOCAL_FILE))
}

/// Get path to global config file (`~/.config/contact-book/connections.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ContactError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join(GLOBAL_DIR).join(GLOBAL_FILE))
}

/// Path for a config location
pub fn config_path(location: ConfigLocation) -> Result<PathBuf> {
    match location {
        ConfigLocation::Local => local_config_path(),
        ConfigLocation::Global => global_config_path(),
    }
}

/// Load a config file. A missing file is an empty config.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| ContactError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str(&contents).map_err(|e| {
        ContactError::config_error(format!("Invalid config file {}: {e}", path.display()))
    })
}

/// Save a config file, creating its directory if needed
pub fn save_config(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            ContactError::config_error(format!("Could not create config directory: {e}"))
        })?;
    }

    let contents = serde_json::to_string_pretty(config)
        .map_err(|e| ContactError::config_error(format!("Could not serialize config: {e}")))?;

    fs::write(path, contents)
        .map_err(|e| ContactError::config_error(format!("Could not write config file: {e}")))?;

    debug!(path = %path.display(), "config saved");
    Ok(())
}

/// Load global then local config and merge them (local wins)
pub fn load_merged(local_path: &Path, global_path: &Path) -> Result<ConfigFile> {
    let global = load_config(global_path)?;
    let local = load_config(local_path)?;
    Ok(global.merged_with(local))
}

/// Load the merged view from the standard locations
pub fn load_with_precedence() -> Result<ConfigFile> {
    load_merged(&local_config_path()?, &global_config_path()?)
}

/// Build the config to run with: profile (named or default), then flags on top
///
/// With no name given and no default profile, the flags (or the built-in
/// `PostgreSQL` defaults) are used alone.
pub fn resolve_with_overrides(
    merged: &ConfigFile,
    name: Option<&str>,
    overrides: &ConnectionOverrides,
) -> Result<ConnectionConfig> {
    let base = match name {
        Some(_) => Some(merged.resolve(name)?),
        None if merged.default.is_some() => Some(merged.resolve(None)?),
        None => None,
    };
    overrides.apply(base)
}

/// Add or replace a profile in the config file at `path`
///
/// The first profile saved to a file becomes its default.
pub fn save_connection_to(path: &Path, name: &str, stored: StoredConnection) -> Result<()> {
    let mut config = load_config(path)?;
    let is_first_connection = config.connections.is_empty();

    config.connections.insert(name.to_string(), stored);
    if is_first_connection {
        config.default = Some(name.to_string());
    }

    save_config(path, &config)
}

/// Save a profile to a standard location and return the file it went to
pub fn save_connection(
    name: &str,
    stored: StoredConnection,
    location: ConfigLocation,
) -> Result<PathBuf> {
    let path = config_path(location)?;
    save_connection_to(&path, name, stored)?;
    Ok(path)
}

/// All known profiles (merged view) with passwords removed
///
/// Returns `(name, config, is_default)` tuples sorted by name.
pub fn list_connections() -> Result<Vec<(String, ConnectionConfig, bool)>> {
    let merged = load_with_precedence()?;
    Ok(merged
        .connections
        .iter()
        .map(|(name, stored)| {
            let mut config = stored.config.clone();
            config.password = None;
            let is_default = merged.default.as_deref() == Some(name.as_str());
            (name.clone(), config, is_default)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DatabaseType;
    use pretty_assertions::assert_eq;

    fn pg_profile(host: &str) -> StoredConnection {
        StoredConnection::new(ConnectionConfig::postgres(
            host.to_string(),
            5432,
            "postgres".to_string(),
            None,
            "contact".to_string(),
        ))
    }

    fn sqlite_profile(file: &str) -> StoredConnection {
        StoredConnection::new(ConnectionConfig::sqlite(PathBuf::from(file)))
    }

    fn temp_config(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("contact_book_config_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir.join(LOCAL_FILE)
    }

    #[test]
    fn test_config_file_format() {
        let json = r#"{
            "connections": {
                "home": { "engine": "postgres", "host": "localhost", "port": 5432,
                          "user": "postgres", "database": "contact", "password_env": "PGPASS" },
                "laptop": { "engine": "sqlite", "file": "/tmp/contacts.db" }
            },
            "default": "home"
        }"#;
        let config: ConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(config.connections.len(), 2);
        assert_eq!(config.default.as_deref(), Some("home"));

        let home = &config.connections["home"];
        assert_eq!(home.config.engine, DatabaseType::Postgres);
        assert_eq!(home.password_env.as_deref(), Some("PGPASS"));

        let laptop = &config.connections["laptop"];
        assert_eq!(laptop.config.engine, DatabaseType::SQLite);
        assert_eq!(laptop.config.file, Some(PathBuf::from("/tmp/contacts.db")));
    }

    #[test]
    fn test_password_env_not_serialized_when_none() {
        let mut config = ConfigFile::default();
        config.connections.insert("laptop".to_string(), sqlite_profile("/tmp/c.db"));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("password_env"));
        assert!(!json.contains("default"));
    }

    #[test]
    fn test_stored_connection_resolve_env_var() {
        std::env::set_var("CONTACT_BOOK_TEST_PASSWORD", "secret");

        let mut stored = pg_profile("localhost");
        stored.password_env = Some("CONTACT_BOOK_TEST_PASSWORD".to_string());

        let resolved = stored.resolve().unwrap();
        assert_eq!(resolved.password, Some("secret".to_string()));

        std::env::remove_var("CONTACT_BOOK_TEST_PASSWORD");
    }

    #[test]
    fn test_stored_connection_resolve_missing_env_var() {
        let mut stored = pg_profile("localhost");
        stored.password_env = Some("CONTACT_BOOK_NONEXISTENT_VAR".to_string());

        let err = stored.resolve().unwrap_err();
        assert!(err.message().contains("Environment variable CONTACT_BOOK_NONEXISTENT_VAR not found"));
    }

    #[test]
    fn test_merge_local_overrides_global() {
        let mut global = ConfigFile::default();
        global.connections.insert("shared".to_string(), pg_profile("global-host"));
        global.connections.insert("global-only".to_string(), pg_profile("other-host"));
        global.default = Some("global-only".to_string());

        let mut local = ConfigFile::default();
        local.connections.insert("shared".to_string(), sqlite_profile("/tmp/local.db"));
        local.default = Some("shared".to_string());

        let merged = global.merged_with(local);
        assert_eq!(merged.connections.len(), 2);
        assert_eq!(merged.connections["shared"].config.engine, DatabaseType::SQLite);
        assert_eq!(merged.default.as_deref(), Some("shared"));
    }

    #[test]
    fn test_merge_keeps_global_default_without_local_default() {
        let mut global = ConfigFile::default();
        global.connections.insert("home".to_string(), pg_profile("localhost"));
        global.default = Some("home".to_string());

        let mut local = ConfigFile::default();
        local.connections.insert("scratch".to_string(), sqlite_profile("/tmp/s.db"));

        let merged = global.merged_with(local);
        assert_eq!(merged.default.as_deref(), Some("home"));
        assert!(merged.connections.contains_key("scratch"));
    }

    #[test]
    fn test_resolve_default_and_named() {
        let mut config = ConfigFile::default();
        config.connections.insert("home".to_string(), pg_profile("db.home"));
        config.connections.insert("laptop".to_string(), sqlite_profile("/tmp/l.db"));
        config.default = Some("home".to_string());

        assert_eq!(config.resolve(None).unwrap().host.as_deref(), Some("db.home"));
        assert_eq!(config.resolve(Some("laptop")).unwrap().engine, DatabaseType::SQLite);

        let err = config.resolve(Some("work")).unwrap_err();
        assert!(err.message().contains("Connection 'work' not found"));
    }

    #[test]
    fn test_resolve_without_default() {
        let mut config = ConfigFile::default();
        config.connections.insert("laptop".to_string(), sqlite_profile("/tmp/l.db"));

        let err = config.resolve(None).unwrap_err();
        assert!(err.message().contains("No default connection set"));
        assert!(err.message().contains("laptop"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let path = temp_config("missing");
        assert_eq!(load_config(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_load_invalid_json() {
        let path = temp_config("invalid_json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ContactError::ConfigError(_)));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_save_connection_first_becomes_default() {
        let path = temp_config("first_default");

        save_connection_to(&path, "laptop", sqlite_profile("/tmp/l.db")).unwrap();
        save_connection_to(&path, "home", pg_profile("localhost")).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.connections.len(), 2);
        assert_eq!(loaded.default.as_deref(), Some("laptop"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_merged_from_files() {
        let local = temp_config("merged_local");
        let global = temp_config("merged_global");

        save_connection_to(&global, "home", pg_profile("global-host")).unwrap();
        save_connection_to(&local, "home", sqlite_profile("/tmp/local.db")).unwrap();

        let merged = load_merged(&local, &global).unwrap();
        assert_eq!(merged.resolve(None).unwrap().engine, DatabaseType::SQLite);

        let _ = fs::remove_dir_all(local.parent().unwrap());
        let _ = fs::remove_dir_all(global.parent().unwrap());
    }

    #[test]
    fn test_overrides_defaults_to_postgres() {
        let config = ConnectionOverrides::default().apply(None).unwrap();
        assert_eq!(config.engine, DatabaseType::Postgres);
        assert_eq!(config.host.as_deref(), Some("localhost"));
        assert_eq!(config.port, Some(5432));
        assert_eq!(config.user.as_deref(), Some("postgres"));
        assert_eq!(config.database.as_deref(), Some("contact"));
        assert_eq!(config.password, None);
    }

    #[test]
    fn test_overrides_file_implies_sqlite() {
        let overrides =
            ConnectionOverrides { file: Some(PathBuf::from("/tmp/c.db")), ..Default::default() };
        let config = overrides.apply(None).unwrap();
        assert_eq!(config.engine, DatabaseType::SQLite);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/c.db")));
    }

    #[test]
    fn test_overrides_sqlite_requires_file() {
        let overrides =
            ConnectionOverrides { engine: Some(DatabaseType::SQLite), ..Default::default() };
        let err = overrides.apply(None).unwrap_err();
        assert!(err.message().contains("--file"));
    }

    #[test]
    fn test_overrides_layer_over_profile() {
        let mut base = pg_profile("db.home").config;
        base.password = Some("from-env".to_string());
        let overrides = ConnectionOverrides { port: Some(6543), ..Default::default() };

        let config = overrides.apply(Some(base)).unwrap();
        assert_eq!(config.host.as_deref(), Some("db.home"));
        assert_eq!(config.port, Some(6543));
        assert_eq!(config.password.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_overrides_engine_switch_drops_profile() {
        let base = pg_profile("db.home").config;
        let overrides =
            ConnectionOverrides { file: Some(PathBuf::from("/tmp/c.db")), engine: Some(DatabaseType::SQLite), ..Default::default() };
        let config = overrides.apply(Some(base)).unwrap();
        assert_eq!(config.engine, DatabaseType::SQLite);
        assert_eq!(config.host, None);
    }

    #[test]
    fn test_resolve_with_overrides() {
        let mut merged = ConfigFile::default();
        assert_eq!(
            resolve_with_overrides(&merged, None, &ConnectionOverrides::default()).unwrap().engine,
            DatabaseType::Postgres
        );

        merged.connections.insert("laptop".to_string(), sqlite_profile("/tmp/l.db"));
        merged.default = Some("laptop".to_string());
        let config = resolve_with_overrides(&merged, None, &ConnectionOverrides::default()).unwrap();
        assert_eq!(config.file, Some(PathBuf::from("/tmp/l.db")));

        let err = resolve_with_overrides(&merged, Some("work"), &ConnectionOverrides::default())
            .unwrap_err();
        assert!(err.message().contains("Connection 'work' not found"));
    }
}
