//! Shared helpers for the SQLite-backed integration tests

#![allow(dead_code)]

use contact_book::{Category, Contact, ConnectionConfig, ContactRepository, NewContact};
use std::path::PathBuf;

/// Fresh database file unique to this test process and call
pub fn temp_db(label: &str) -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let temp_file = std::env::temp_dir()
        .join(format!("contact_book_{label}_{}_{id}.db", std::process::id()));
    let _ = std::fs::remove_file(&temp_file);
    temp_file
}

pub fn cleanup_db(path: &PathBuf) {
    let _ = std::fs::remove_file(path);
}

/// Repository over a new database with the schema in place
pub async fn fresh_repo(label: &str) -> (ContactRepository, PathBuf) {
    let path = temp_db(label);
    let repo = ContactRepository::new(ConnectionConfig::sqlite(path.clone()));
    repo.ensure_schema().await.expect("schema setup");
    (repo, path)
}

pub async fn add(repo: &ContactRepository, name: &str, phone: &str, category: Category) -> Contact {
    repo.add(NewContact::new(name, phone, category)).await.expect("add contact")
}
