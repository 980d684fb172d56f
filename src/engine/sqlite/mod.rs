//! `SQLite` Contact Store Implementation
//!
//! This module implements the `ContactStore` trait for `SQLite` databases.
//!
//! # Implementation Notes
//! - Uses `rusqlite` (synchronous driver, no async needed)
//! - The database exists once its file is opened with create flags
//! - `INTEGER PRIMARY KEY AUTOINCREMENT` so deleted ids are never handed out again
//! - `created_at` is stored as UTC text with millisecond precision
//! - Search lowercases both sides with `unicode_lower`, a Rust scalar function
//!   registered on every connection, since built-in `LIKE` folds ASCII only
//! - Dropping an uncommitted `Transaction` rolls it back

use chrono::NaiveDate;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use tracing::debug;

use crate::contact::{follow_up_cutoff, Category, Contact, ContactStats, NewContact, SortOrder, RECENT_LIMIT};
use crate::engine::{like_pattern, ConnectionConfig, ContactStore, DatabaseType, SchemaReport};
use crate::error::{ContactError, Result};

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS contacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL CHECK (length(trim(name)) > 0),
        phone TEXT NOT NULL UNIQUE,
        email TEXT,
        category TEXT NOT NULL CHECK (category IN ('friend', 'family', 'work', 'other')),
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
        last_contacted TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts (name);
    CREATE INDEX IF NOT EXISTS idx_contacts_phone ON contacts (phone);";

const SELECT_COLUMNS: &str =
    "SELECT id, name, phone, email, category, created_at, last_contacted FROM contacts";

/// `SQLite` contact store implementation
pub struct SqliteStore;

impl ContactStore for SqliteStore {
    async fn ensure_schema(config: &ConnectionConfig) -> Result<SchemaReport> {
        let path = file_path(config)?;
        let database_created = path == ":memory:" || !std::path::Path::new(path).exists();

        let conn = open_connection(config)?;
        conn.execute_batch(SCHEMA_SQL).map_err(|e| {
            ContactError::engine_error("sqlite", format!("Failed to create contacts table: {e}"))
        })?;

        debug!(path, database_created, "sqlite schema ready");
        Ok(SchemaReport { database_created })
    }

    async fn add(config: &ConnectionConfig, contact: &NewContact) -> Result<Contact> {
        let mut conn = open_connection(config)?;
        let tx = conn.transaction().map_err(|e| {
            ContactError::query_failed(format!("Failed to begin transaction: {e}"))
        })?;

        let inserted = tx.execute(
            "INSERT INTO contacts (name, phone, email, category, last_contacted)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                contact.name,
                contact.phone,
                contact.email,
                contact.category.as_str(),
                contact.last_contacted,
            ],
        );

        if let Err(e) = inserted {
            // tx is dropped here, which rolls back
            return Err(if is_unique_violation(&e) {
                ContactError::duplicate_phone(&contact.phone)
            } else {
                ContactError::query_failed(format!("Failed to add contact: {e}"))
            });
        }

        let id = tx.last_insert_rowid();
        let stored = tx
            .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [id], row_to_contact)
            .map_err(|e| ContactError::query_failed(format!("Failed to read new contact: {e}")))?;

        tx.commit()
            .map_err(|e| ContactError::query_failed(format!("Failed to commit contact: {e}")))?;

        debug!(id, "sqlite insert committed");
        Ok(stored)
    }

    async fn list(config: &ConnectionConfig, order: SortOrder) -> Result<Vec<Contact>> {
        let conn = open_connection(config)?;
        let sql = format!("{SELECT_COLUMNS} ORDER BY {}", order.order_by());
        query_contacts(&conn, &sql, [])
    }

    async fn search(config: &ConnectionConfig, term: &str) -> Result<Vec<Contact>> {
        let conn = open_connection(config)?;
        let sql = format!(
            r"{SELECT_COLUMNS}
              WHERE unicode_lower(name) LIKE ?1 ESCAPE '\' OR phone LIKE ?1 ESCAPE '\'
              ORDER BY name ASC, id ASC"
        );
        query_contacts(&conn, &sql, [like_pattern(&term.to_lowercase())])
    }

    async fn find(config: &ConnectionConfig, id: i64) -> Result<Contact> {
        let conn = open_connection(config)?;
        conn.query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [id], row_to_contact)
            .optional()
            .map_err(|e| ContactError::query_failed(format!("Failed to look up contact: {e}")))?
            .ok_or(ContactError::not_found(id))
    }

    async fn delete(config: &ConnectionConfig, id: i64) -> Result<String> {
        let mut conn = open_connection(config)?;
        let tx = conn.transaction().map_err(|e| {
            ContactError::query_failed(format!("Failed to begin transaction: {e}"))
        })?;

        let name: String = tx
            .query_row("SELECT name FROM contacts WHERE id = ?1", [id], |row| row.get(0))
            .optional()
            .map_err(|e| ContactError::query_failed(format!("Failed to look up contact: {e}")))?
            .ok_or(ContactError::not_found(id))?;

        tx.execute("DELETE FROM contacts WHERE id = ?1", [id])
            .map_err(|e| ContactError::query_failed(format!("Failed to delete contact: {e}")))?;

        tx.commit()
            .map_err(|e| ContactError::query_failed(format!("Failed to commit delete: {e}")))?;

        debug!(id, "sqlite delete committed");
        Ok(name)
    }

    async fn stats(config: &ConnectionConfig, today: NaiveDate) -> Result<ContactStats> {
        let conn = open_connection(config)?;

        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))
            .map_err(|e| ContactError::query_failed(format!("Failed to count contacts: {e}")))?;

        let mut by_category = {
            let mut stmt = conn
                .prepare("SELECT category, COUNT(*) FROM contacts GROUP BY category")
                .map_err(|e| {
                    ContactError::query_failed(format!("Failed to prepare category counts: {e}"))
                })?;
            let counts = stmt
                .query_map([], |row| Ok((category_column(row, 0)?, row.get::<_, i64>(1)?)))
                .map_err(|e| ContactError::query_failed(format!("Failed to count categories: {e}")))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| ContactError::query_failed(format!("Failed to read category counts: {e}")))?;
            counts
        };
        by_category.sort_by_key(|(category, _)| *category);

        let recent = query_contacts(
            &conn,
            &format!("{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT {RECENT_LIMIT}"),
            [],
        )?;

        let needs_follow_up = query_contacts(
            &conn,
            &format!(
                "{SELECT_COLUMNS}
                 WHERE last_contacted IS NULL OR last_contacted < ?1
                 ORDER BY name ASC, id ASC"
            ),
            [follow_up_cutoff(today)],
        )?;

        Ok(ContactStats { total, by_category, recent, needs_follow_up })
    }
}

/// Extract the database file path from the config
fn file_path(config: &ConnectionConfig) -> Result<&str> {
    if config.engine != DatabaseType::SQLite {
        return Err(ContactError::config_error(format!(
            "Expected SQLite engine, got {}",
            config.engine
        )));
    }

    let file = config
        .file
        .as_ref()
        .ok_or_else(|| ContactError::config_error("SQLite requires 'file' parameter"))?;

    file.to_str().ok_or_else(|| {
        ContactError::config_error("SQLite file path contains invalid UTF-8 characters")
    })
}

/// Open a read-write connection, creating the file if needed
fn open_connection(config: &ConnectionConfig) -> Result<Connection> {
    let path = file_path(config)?;
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;

    let conn = Connection::open_with_flags(path, flags).map_err(|e| {
        ContactError::connection_failed(format!("Failed to open SQLite database: {e}"))
    })?;

    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
    )
    .map_err(|e| {
        ContactError::engine_error("sqlite", format!("Failed to register unicode_lower: {e}"))
    })?;

    Ok(conn)
}

/// Run a contact-returning query
fn query_contacts<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Contact>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| ContactError::query_failed(format!("Failed to prepare query: {e}")))?;

    let contacts = stmt
        .query_map(params, row_to_contact)
        .map_err(|e| ContactError::query_failed(format!("Failed to run query: {e}")))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ContactError::query_failed(format!("Failed to read contacts: {e}")))?;
    Ok(contacts)
}

fn row_to_contact(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        category: category_column(row, 4)?,
        created_at: row.get(5)?,
        last_contacted: row.get(6)?,
    })
}

fn category_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Category> {
    let text: String = row.get(idx)?;
    text.parse::<Category>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
