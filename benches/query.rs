//! Query Performance Benchmarks
//!
//! Listing, searching, and statistics over a populated SQLite contact book.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

#[cfg(feature = "sqlite")]
use contact_book::{Category, ConnectionConfig, ContactRepository, NewContact, SortOrder};

#[cfg(feature = "sqlite")]
fn populated_repo(name: &str, rows: usize, runtime: &tokio::runtime::Runtime) -> (ContactRepository, std::path::PathBuf) {
    let temp_file = std::env::temp_dir().join(format!("bench_contacts_{name}.db"));
    let _ = std::fs::remove_file(&temp_file);

    let repo = ContactRepository::new(ConnectionConfig::sqlite(temp_file.clone()));
    runtime.block_on(async {
        repo.ensure_schema().await.expect("Failed to create schema");
        for i in 0..rows {
            let category = Category::ALL[i % Category::ALL.len()];
            repo.add(NewContact::new(format!("Person {i:04}"), format!("555{i:07}"), category))
                .await
                .expect("Failed to insert");
        }
    });

    (repo, temp_file)
}

#[cfg(feature = "sqlite")]
fn bench_sqlite_list(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let (repo, temp_file) = populated_repo("list", 500, &runtime);

    for order in [SortOrder::NameAsc, SortOrder::NewestFirst, SortOrder::Category] {
        c.bench_function(&format!("sqlite_list_{order:?}"), |b| {
            b.iter(|| {
                let result = runtime.block_on(repo.list(black_box(order)));
                assert!(result.is_ok());
                result
            });
        });
    }

    let _ = std::fs::remove_file(&temp_file);
}

#[cfg(feature = "sqlite")]
fn bench_sqlite_search(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let (repo, temp_file) = populated_repo("search", 500, &runtime);

    c.bench_function("sqlite_search_name", |b| {
        b.iter(|| runtime.block_on(repo.search(black_box("person 04"))));
    });
    c.bench_function("sqlite_search_phone", |b| {
        b.iter(|| runtime.block_on(repo.search(black_box("0000123"))));
    });

    let _ = std::fs::remove_file(&temp_file);
}

#[cfg(feature = "sqlite")]
fn bench_sqlite_stats(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let (repo, temp_file) = populated_repo("stats", 500, &runtime);

    c.bench_function("sqlite_stats", |b| {
        b.iter(|| runtime.block_on(repo.stats()));
    });

    let _ = std::fs::remove_file(&temp_file);
}

#[cfg(feature = "sqlite")]
criterion_group!(benches, bench_sqlite_list, bench_sqlite_search, bench_sqlite_stats);

#[cfg(not(feature = "sqlite"))]
fn bench_disabled(_c: &mut Criterion) {}

#[cfg(not(feature = "sqlite"))]
criterion_group!(benches, bench_disabled);

criterion_main!(benches);
