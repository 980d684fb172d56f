//! `PostgreSQL` Contact Store Implementation
//!
//! This module implements the `ContactStore` trait for `PostgreSQL` databases.
//!
//! # Implementation Notes
//! - Uses `tokio-postgres` (async driver, requires tokio runtime)
//! - One client per operation; the connection task ends when the client drops
//! - Schema setup creates the target database from the `postgres` maintenance
//!   database when it does not exist yet
//! - `BIGSERIAL` ids come from a sequence and are never reused
//! - `created_at` is stored as a UTC `TIMESTAMP`
//! - Search uses `ILIKE` (case-insensitive, locale aware)

use chrono::NaiveDate;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, Config, NoTls, Row};
use tracing::debug;

use crate::contact::{follow_up_cutoff, Category, Contact, ContactStats, NewContact, SortOrder, RECENT_LIMIT};
use crate::engine::{like_pattern, ConnectionConfig, ContactStore, DatabaseType, SchemaReport};
use crate::error::{ContactError, Result};

/// Database used to create the target database when it is missing
const MAINTENANCE_DATABASE: &str = "postgres";

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS contacts (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL CHECK (length(trim(name)) > 0),
        phone VARCHAR(20) NOT NULL UNIQUE,
        email VARCHAR(100),
        category VARCHAR(50) NOT NULL CHECK (category IN ('friend', 'family', 'work', 'other')),
        created_at TIMESTAMP NOT NULL DEFAULT (CURRENT_TIMESTAMP AT TIME ZONE 'UTC'),
        last_contacted DATE
    );
    CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts (name);
    CREATE INDEX IF NOT EXISTS idx_contacts_phone ON contacts (phone);";

const CONTACT_COLUMNS: &str = "id, name, phone, email, category, created_at, last_contacted";

/// `PostgreSQL` contact store implementation
pub struct PostgresStore;

impl ContactStore for PostgresStore {
    async fn ensure_schema(config: &ConnectionConfig) -> Result<SchemaReport> {
        let target = build_pg_config(config, None)?;
        let database = database_name(config)?;

        let (client, database_created) = match connect(&target).await {
            Ok(client) => (client, false),
            Err(e) if e.code() == Some(&SqlState::INVALID_CATALOG_NAME) => {
                create_database(config, database).await?;
                (connect(&target).await.map_err(connection_error)?, true)
            }
            Err(e) => return Err(connection_error(e)),
        };

        client.batch_execute(SCHEMA_SQL).await.map_err(|e| {
            ContactError::engine_error("postgres", format!("Failed to create contacts table: {e}"))
        })?;

        debug!(database, database_created, "postgres schema ready");
        Ok(SchemaReport { database_created })
    }

    async fn add(config: &ConnectionConfig, contact: &NewContact) -> Result<Contact> {
        let mut client = connect_target(config).await?;
        let tx = client.transaction().await.map_err(|e| {
            ContactError::query_failed(format!("Failed to begin transaction: {e}"))
        })?;

        let sql = format!(
            "INSERT INTO contacts (name, phone, email, category, last_contacted)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CONTACT_COLUMNS}"
        );
        let category = contact.category.as_str();
        let inserted = tx
            .query_one(
                &sql,
                &[&contact.name, &contact.phone, &contact.email, &category, &contact.last_contacted],
            )
            .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    ContactError::duplicate_phone(&contact.phone)
                } else {
                    ContactError::query_failed(format!("Failed to add contact: {e}"))
                });
            }
        };

        let stored = row_to_contact(&row)?;
        tx.commit()
            .await
            .map_err(|e| ContactError::query_failed(format!("Failed to commit contact: {e}")))?;

        debug!(id = stored.id, "postgres insert committed");
        Ok(stored)
    }

    async fn list(config: &ConnectionConfig, order: SortOrder) -> Result<Vec<Contact>> {
        let client = connect_target(config).await?;
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY {}", order.order_by());
        let rows = client
            .query(&sql, &[])
            .await
            .map_err(|e| ContactError::query_failed(format!("Failed to list contacts: {e}")))?;
        rows_to_contacts(&rows)
    }

    async fn search(config: &ConnectionConfig, term: &str) -> Result<Vec<Contact>> {
        let client = connect_target(config).await?;
        let sql = format!(
            r"SELECT {CONTACT_COLUMNS} FROM contacts
              WHERE name ILIKE $1 ESCAPE '\' OR phone ILIKE $1 ESCAPE '\'
              ORDER BY name ASC, id ASC"
        );
        let pattern = like_pattern(term);
        let rows = client
            .query(&sql, &[&pattern])
            .await
            .map_err(|e| ContactError::query_failed(format!("Failed to search contacts: {e}")))?;
        rows_to_contacts(&rows)
    }

    async fn find(config: &ConnectionConfig, id: i64) -> Result<Contact> {
        let client = connect_target(config).await?;
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1");
        let row = client
            .query_opt(&sql, &[&id])
            .await
            .map_err(|e| ContactError::query_failed(format!("Failed to look up contact: {e}")))?
            .ok_or(ContactError::not_found(id))?;
        row_to_contact(&row)
    }

    async fn delete(config: &ConnectionConfig, id: i64) -> Result<String> {
        let mut client = connect_target(config).await?;
        let tx = client.transaction().await.map_err(|e| {
            ContactError::query_failed(format!("Failed to begin transaction: {e}"))
        })?;

        let deleted = tx
            .query_opt("DELETE FROM contacts WHERE id = $1 RETURNING name", &[&id])
            .await
            .map_err(|e| ContactError::query_failed(format!("Failed to delete contact: {e}")))?;

        let Some(row) = deleted else {
            let _ = tx.rollback().await;
            return Err(ContactError::not_found(id));
        };
        let name: String = row.try_get(0).map_err(conversion_error)?;

        tx.commit()
            .await
            .map_err(|e| ContactError::query_failed(format!("Failed to commit delete: {e}")))?;

        debug!(id, "postgres delete committed");
        Ok(name)
    }

    async fn stats(config: &ConnectionConfig, today: NaiveDate) -> Result<ContactStats> {
        let client = connect_target(config).await?;

        let total: i64 = client
            .query_one("SELECT COUNT(*) FROM contacts", &[])
            .await
            .map_err(|e| ContactError::query_failed(format!("Failed to count contacts: {e}")))?
            .try_get(0)
            .map_err(conversion_error)?;

        let category_rows = client
            .query("SELECT category, COUNT(*) FROM contacts GROUP BY category", &[])
            .await
            .map_err(|e| ContactError::query_failed(format!("Failed to count categories: {e}")))?;
        let mut by_category = category_rows
            .iter()
            .map(|row| -> Result<(Category, i64)> {
                let category = category_column(row, 0)?;
                let count: i64 = row.try_get(1).map_err(conversion_error)?;
                Ok((category, count))
            })
            .collect::<Result<Vec<_>>>()?;
        by_category.sort_by_key(|(category, _)| *category);

        let recent_sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts
             ORDER BY created_at DESC, id DESC LIMIT {RECENT_LIMIT}"
        );
        let recent_rows = client
            .query(&recent_sql, &[])
            .await
            .map_err(|e| ContactError::query_failed(format!("Failed to load recent contacts: {e}")))?;

        let follow_up_sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts
             WHERE last_contacted IS NULL OR last_contacted < $1
             ORDER BY name ASC, id ASC"
        );
        let cutoff = follow_up_cutoff(today);
        let follow_up_rows = client
            .query(&follow_up_sql, &[&cutoff])
            .await
            .map_err(|e| ContactError::query_failed(format!("Failed to load follow-ups: {e}")))?;

        Ok(ContactStats {
            total,
            by_category,
            recent: rows_to_contacts(&recent_rows)?,
            needs_follow_up: rows_to_contacts(&follow_up_rows)?,
        })
    }
}

/// Target database name from the config
fn database_name(config: &ConnectionConfig) -> Result<&str> {
    config
        .database
        .as_deref()
        .ok_or_else(|| ContactError::config_error("PostgreSQL requires 'database' parameter"))
}

/// Build `PostgreSQL` connection config from `ConnectionConfig`
///
/// `dbname_override` connects to another database on the same server.
fn build_pg_config(config: &ConnectionConfig, dbname_override: Option<&str>) -> Result<Config> {
    if config.engine != DatabaseType::Postgres {
        return Err(ContactError::config_error(format!(
            "Expected PostgreSQL engine, got {}",
            config.engine
        )));
    }

    let host = config
        .host
        .as_ref()
        .ok_or_else(|| ContactError::config_error("PostgreSQL requires 'host' parameter"))?;

    let port = config
        .port
        .ok_or_else(|| ContactError::config_error("PostgreSQL requires 'port' parameter"))?;

    let user = config
        .user
        .as_ref()
        .ok_or_else(|| ContactError::config_error("PostgreSQL requires 'user' parameter"))?;

    let password = config
        .password
        .as_ref()
        .ok_or_else(|| ContactError::config_error("PostgreSQL requires 'password' parameter"))?;

    let db_name = match dbname_override {
        Some(name) => name,
        None => database_name(config)?,
    };

    let mut pg_config = Config::new();
    pg_config
        .host(host)
        .port(port)
        .user(user)
        .password(password)
        .dbname(db_name)
        .application_name("contact-book");

    Ok(pg_config)
}

/// Connect and drive the connection in the background
async fn connect(pg_config: &Config) -> std::result::Result<Client, tokio_postgres::Error> {
    let (client, connection) = pg_config.connect(NoTls).await?;

    // Connection errors are not logged to prevent credential leakage
    tokio::spawn(async move {
        let _ = connection.await;
    });

    Ok(client)
}

async fn connect_target(config: &ConnectionConfig) -> Result<Client> {
    let pg_config = build_pg_config(config, None)?;
    connect(&pg_config).await.map_err(connection_error)
}

async fn create_database(config: &ConnectionConfig, database: &str) -> Result<()> {
    let admin_config = build_pg_config(config, Some(MAINTENANCE_DATABASE))?;
    let admin = connect(&admin_config).await.map_err(connection_error)?;

    let exists = admin
        .query_opt("SELECT 1 FROM pg_database WHERE datname = $1", &[&database])
        .await
        .map_err(|e| ContactError::engine_error("postgres", format!("Failed to check database: {e}")))?
        .is_some();

    if !exists {
        admin
            .batch_execute(&format!("CREATE DATABASE {}", quote_ident(database)))
            .await
            .map_err(|e| {
                ContactError::engine_error("postgres", format!("Failed to create database: {e}"))
            })?;
        debug!(database, "issued CREATE DATABASE");
    }

    Ok(())
}

/// Quote an identifier for DDL (database names cannot be bound as parameters)
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn connection_error(e: tokio_postgres::Error) -> ContactError {
    ContactError::connection_failed(format!("Failed to connect to PostgreSQL: {e}"))
}

fn conversion_error(e: tokio_postgres::Error) -> ContactError {
    ContactError::engine_error("postgres", format!("Failed to convert column: {e}"))
}

fn rows_to_contacts(rows: &[Row]) -> Result<Vec<Contact>> {
    rows.iter().map(row_to_contact).collect()
}

fn row_to_contact(row: &Row) -> Result<Contact> {
    Ok(Contact {
        id: row.try_get(0).map_err(conversion_error)?,
        name: row.try_get(1).map_err(conversion_error)?,
        phone: row.try_get(2).map_err(conversion_error)?,
        email: row.try_get(3).map_err(conversion_error)?,
        category: category_column(row, 4)?,
        created_at: row.try_get(5).map_err(conversion_error)?,
        last_contacted: row.try_get(6).map_err(conversion_error)?,
    })
}

fn category_column(row: &Row, idx: usize) -> Result<Category> {
    let text: String = row.try_get(idx).map_err(conversion_error)?;
    text.parse::<Category>().map_err(|_| {
        ContactError::engine_error("postgres", format!("Unknown category '{text}' in contacts table"))
    })
}
