//! Contact Repository
//!
//! The repository owns an explicitly constructed [`ConnectionConfig`] and routes
//! each domain operation to the engine the config names. Input is validated here,
//! before any connection is opened.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::contact::{Contact, ContactStats, NewContact, SortOrder};
#[cfg(feature = "postgres")]
use crate::engine::postgres::PostgresStore;
#[cfg(feature = "sqlite")]
use crate::engine::sqlite::SqliteStore;
#[cfg(any(feature = "postgres", feature = "sqlite"))]
use crate::engine::{ContactStore, DatabaseType};
use crate::engine::{ConnectionConfig, SchemaReport};
use crate::error::{ContactError, Result};

/// Route a `ContactStore` call to the engine selected by the config
macro_rules! dispatch {
    ($config:expr, $method:ident($($arg:expr),*)) => {
        match $config.engine {
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => PostgresStore::$method($config, $($arg),*).await,
            #[cfg(feature = "sqlite")]
            DatabaseType::SQLite => SqliteStore::$method($config, $($arg),*).await,
            #[allow(unreachable_patterns)]
            engine => Err(ContactError::config_error(format!(
                "Engine '{engine}' is not enabled in this build"
            ))),
        }
    };
}

/// Contact repository bound to one database
#[derive(Debug, Clone)]
pub struct ContactRepository {
    config: ConnectionConfig,
}

impl ContactRepository {
    #[must_use]
    pub const fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Make sure the database, table, and indexes exist
    ///
    /// Callers treat a failure here as fatal.
    pub async fn ensure_schema(&self) -> Result<SchemaReport> {
        let report = dispatch!(&self.config, ensure_schema())?;
        if report.database_created {
            info!(target_db = %self.config.describe(), "created contact database");
        }
        Ok(report)
    }

    /// Validate and insert a contact
    pub async fn add(&self, contact: NewContact) -> Result<Contact> {
        let contact = contact.validate()?;
        match dispatch!(&self.config, add(&contact)) {
            Ok(stored) => {
                debug!(id = stored.id, "contact added");
                Ok(stored)
            }
            Err(e) => {
                warn!(code = e.error_code(), "add contact failed");
                Err(e)
            }
        }
    }

    /// All contacts in the requested order
    pub async fn list(&self, order: SortOrder) -> Result<Vec<Contact>> {
        debug!(?order, "listing contacts");
        dispatch!(&self.config, list(order))
    }

    /// Case-insensitive substring search over name and phone
    pub async fn search(&self, term: &str) -> Result<Vec<Contact>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ContactError::validation("Search term cannot be empty"));
        }
        debug!(term, "searching contacts");
        dispatch!(&self.config, search(term))
    }

    /// Look up a contact without changing anything
    pub async fn find(&self, id: i64) -> Result<Contact> {
        dispatch!(&self.config, find(id))
    }

    /// Delete a contact and return its name
    pub async fn delete(&self, id: i64) -> Result<String> {
        let name = dispatch!(&self.config, delete(id))?;
        debug!(id, "contact deleted");
        Ok(name)
    }

    /// Statistics as of the local current date
    pub async fn stats(&self) -> Result<ContactStats> {
        self.stats_as_of(Local::now().date_naive()).await
    }

    /// Statistics with an explicit "today" for the follow-up cutoff
    pub async fn stats_as_of(&self, today: NaiveDate) -> Result<ContactStats> {
        dispatch!(&self.config, stats(today))
    }
}
