//! Storage Engine Traits and Core Types
//!
//! This module defines the core abstractions for the contact store.
//! Each engine (`PostgreSQL`, `SQLite`) implements the `ContactStore` trait.
//!
//! # Stateless Design
//! All trait methods are stateless and take `&ConnectionConfig` as input.
//! A connection is opened, used, and closed within each method call, on every
//! exit path including errors.
//!
//! # Engine Isolation
//! Each engine implementation is independent. The only shared pieces are the
//! domain types and the fixed `ORDER BY` fragments on [`SortOrder`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::contact::{Contact, ContactStats, NewContact, SortOrder};
use crate::error::Result;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

/// Default `PostgreSQL` connection values
pub const DEFAULT_PG_HOST: &str = "localhost";
pub const DEFAULT_PG_PORT: u16 = 5432;
pub const DEFAULT_PG_USER: &str = "postgres";
pub const DEFAULT_PG_DATABASE: &str = "contact";

/// Supported database engine types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `PostgreSQL` database
    Postgres,
    /// `SQLite` database
    #[value(name = "sqlite")]
    SQLite,
}

impl DatabaseType {
    /// Get the engine name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::SQLite => "sqlite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connection configuration for the contact store
///
/// Built once at startup and handed to the repository; nothing is global.
/// Fields are engine-specific (e.g., `file` only applies to `SQLite`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database engine type
    pub engine: DatabaseType,

    /// Hostname (for postgres)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Port number (for postgres)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Username (for postgres)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password (for postgres)
    /// WARNING: Sensitive data, do not log or include in error messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Database name (for postgres)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Database file path (for sqlite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl ConnectionConfig {
    /// Create a new `PostgreSQL` connection config
    #[must_use]
    pub const fn postgres(
        host: String,
        port: u16,
        user: String,
        password: Option<String>,
        database: String,
    ) -> Self {
        Self {
            engine: DatabaseType::Postgres,
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password,
            database: Some(database),
            file: None,
        }
    }

    /// Create a new `SQLite` connection config
    #[must_use]
    pub const fn sqlite(file: PathBuf) -> Self {
        Self {
            engine: DatabaseType::SQLite,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            file: Some(file),
        }
    }

    /// True when a password must be collected before connecting
    #[must_use]
    pub const fn needs_password(&self) -> bool {
        matches!(self.engine, DatabaseType::Postgres) && self.password.is_none()
    }

    /// One-line description without credentials
    #[must_use]
    pub fn describe(&self) -> String {
        match self.engine {
            DatabaseType::Postgres => format!(
                "postgres://{}@{}:{}/{}",
                self.user.as_deref().unwrap_or("?"),
                self.host.as_deref().unwrap_or("?"),
                self.port.map_or_else(|| "?".to_string(), |p| p.to_string()),
                self.database.as_deref().unwrap_or("?"),
            ),
            DatabaseType::SQLite => format!(
                "sqlite://{}",
                self.file.as_ref().map_or_else(|| "?".to_string(), |f| f.display().to_string())
            ),
        }
    }
}

/// Outcome of schema setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchemaReport {
    /// The database itself had to be created
    pub database_created: bool,
}

/// Contact store trait
///
/// All engines implement this trait.
/// Each method is stateless and takes a connection config as input.
pub trait ContactStore {
    /// Create the database (if absent), the contacts table (if absent), and the
    /// name/phone indexes. Safe to call repeatedly.
    fn ensure_schema(
        config: &ConnectionConfig,
    ) -> impl std::future::Future<Output = Result<SchemaReport>> + Send;

    /// Insert a validated contact inside a transaction
    ///
    /// Fails with `DuplicatePhone` when the phone already exists; the transaction
    /// is rolled back and nothing is written.
    fn add(
        config: &ConnectionConfig,
        contact: &NewContact,
    ) -> impl std::future::Future<Output = Result<Contact>> + Send;

    /// All contacts in the given order. An empty table gives an empty vector.
    fn list(
        config: &ConnectionConfig,
        order: SortOrder,
    ) -> impl std::future::Future<Output = Result<Vec<Contact>>> + Send;

    /// Contacts whose name or phone contains `term`, case-insensitively
    fn search(
        config: &ConnectionConfig,
        term: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Contact>>> + Send;

    /// Look up one contact, `NotFound` if absent
    fn find(
        config: &ConnectionConfig,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Contact>> + Send;

    /// Delete by id and return the deleted contact's name, `NotFound` if absent
    fn delete(
        config: &ConnectionConfig,
        id: i64,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Totals, per-category counts, recent additions, and follow-ups as of `today`
    fn stats(
        config: &ConnectionConfig,
        today: NaiveDate,
    ) -> impl std::future::Future<Output = Result<ContactStats>> + Send;
}

/// Build a `LIKE` pattern matching `term` literally anywhere in the value
///
/// `%`, `_` and `\` are escaped with `\`; statements must declare `ESCAPE '\'`.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        match c {
            '%' | '_' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            _ => pattern.push(c),
        }
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_serialization() {
        assert_eq!(serde_json::to_string(&DatabaseType::Postgres).unwrap(), r#""postgres""#);
        assert_eq!(serde_json::to_string(&DatabaseType::SQLite).unwrap(), r#""sqlite""#);
        assert_eq!(
            serde_json::from_str::<DatabaseType>(r#""sqlite""#).unwrap(),
            DatabaseType::SQLite
        );
    }

    #[test]
    fn test_connection_config_constructors() {
        let pg_config = ConnectionConfig::postgres(
            "localhost".to_string(),
            5432,
            "user".to_string(),
            None,
            "contact".to_string(),
        );
        assert_eq!(pg_config.engine, DatabaseType::Postgres);
        assert_eq!(pg_config.port, Some(5432));
        assert!(pg_config.needs_password());

        let sqlite_config = ConnectionConfig::sqlite(PathBuf::from("/tmp/contacts.db"));
        assert_eq!(sqlite_config.engine, DatabaseType::SQLite);
        assert!(sqlite_config.file.is_some());
        assert!(!sqlite_config.needs_password());
    }

    #[test]
    fn test_describe_hides_password() {
        let config = ConnectionConfig::postgres(
            "db.local".to_string(),
            5433,
            "me".to_string(),
            Some("hunter2".to_string()),
            "contact".to_string(),
        );
        let description = config.describe();
        assert_eq!(description, "postgres://me@db.local:5433/contact");
        assert!(!description.contains("hunter2"));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("1234"), "%1234%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
