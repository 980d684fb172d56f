//! Contact Book - Personal Contact Manager
//!
//! A console tool for keeping a personal address book in a single `contacts`
//! table. Contacts can be added, listed in several orders, searched by name or
//! phone, deleted after confirmation, and summarized.
//!
//! # Architecture
//! Data flows one way: console input → validators → repository → database →
//! formatted console output.
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`validate`] - Pure phone/email/category/date validators
//! - [`contact`] - Contact record, categories, sort orders, statistics
//! - [`engine`] - Storage engine trait and `PostgreSQL`/`SQLite` implementations
//! - [`repository`] - Config-bound facade that validates and dispatches to an engine
//! - [`config`] - Named connection profiles
//! - [`output`] - Text rendering for tables and statistics
//! - [`console`] - Prompt/response collaborator
//! - [`menu`] - The interactive menu loop

pub mod config;
pub mod console;
pub mod contact;
pub mod engine;
pub mod error;
pub mod menu;
pub mod output;
pub mod repository;
pub mod validate;

// Re-export commonly used types for convenience
pub use config::{
    list_connections, resolve_with_overrides, save_connection, ConfigFile, ConfigLocation,
    ConnectionOverrides, StoredConnection,
};
pub use console::{Console, ScriptedConsole, TerminalConsole};
pub use contact::{Category, Contact, ContactStats, NewContact, SortOrder};
pub use engine::{ConnectionConfig, ContactStore, DatabaseType, SchemaReport};
pub use error::{ContactError, Result};
pub use menu::{Menu, MenuChoice};
pub use repository::ContactRepository;
pub use validate::{validate_category, validate_email, validate_phone};
