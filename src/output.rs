//! Console Output Formatting
//!
//! Pure functions that turn contacts and statistics into the text the menu prints.
//! Nothing here writes to the terminal; the console collaborator does that.
//!
//! # Output Contract
//! - Contact table: fixed-width `ID / Name / Phone / Email / Category / Last Contacted`
//!   columns under a 90-character rule
//! - Missing email renders as blank, missing last-contacted date as `Never`
//! - Dates render as `YYYY-MM-DD`

use chrono::NaiveDate;
use std::fmt::Write;

use crate::contact::{Contact, ContactStats, SortOrder};

const RULE_WIDTH: usize = 90;

/// Shown when a listing has no rows
pub const NO_CONTACTS: &str = "No contacts found.";

/// Shown when a search has no hits
pub const NO_RESULTS: &str = "No results.";

/// Main menu choices, numbered 1 through 6
pub const MAIN_MENU_ITEMS: [&str; 6] = [
    "Add New Contact",
    "View All Contacts",
    "Search Contacts",
    "Delete Contact",
    "View Statistics",
    "Exit",
];

/// Date or `Never`
#[must_use]
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "Never".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

/// Banner and numbered main menu
#[must_use]
pub fn render_main_menu() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out, "CONTACT BOOK");
    let _ = writeln!(out, "{}", "=".repeat(50));
    for (i, item) in MAIN_MENU_ITEMS.iter().enumerate() {
        let _ = writeln!(out, "{}. {item}", i + 1);
    }
    out
}

/// Numbered sort options for the listing
#[must_use]
pub fn render_sort_menu() -> String {
    let mut out = String::new();
    for (i, order) in SortOrder::ALL.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, order.label());
    }
    out
}

/// Fixed-width contact table, or [`NO_CONTACTS`]
#[must_use]
pub fn render_contact_table(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return format!("{NO_CONTACTS}\n");
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4} {:<20} {:<15} {:<25} {:<10} {}",
        "ID", "Name", "Phone", "Email", "Category", "Last Contacted"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    for c in contacts {
        let _ = writeln!(
            out,
            "{:<4} {:<20} {:<15} {:<25} {:<10} {}",
            c.id,
            c.name,
            c.phone,
            c.email.as_deref().unwrap_or(""),
            c.category.as_str(),
            format_date(c.last_contacted)
        );
    }
    out
}

/// One line per hit, or [`NO_RESULTS`]
#[must_use]
pub fn render_search_results(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return format!("{NO_RESULTS}\n");
    }

    let mut out = String::new();
    for c in contacts {
        let _ = writeln!(
            out,
            "ID: {}, Name: {}, Phone: {}, Email: {}, Category: {}",
            c.id,
            c.name,
            c.phone,
            c.email.as_deref().unwrap_or(""),
            c.category.as_str()
        );
    }
    out
}

/// Totals, per-category counts, recent additions, and follow-ups
#[must_use]
pub fn render_stats(stats: &ContactStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total: {}", stats.total);
    for (category, count) in &stats.by_category {
        let _ = writeln!(out, "  {}: {count}", category.label());
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Recently added:");
    if stats.recent.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for c in &stats.recent {
        let _ = writeln!(out, "  {} - {}", c.name, c.created_at.format("%Y-%m-%d"));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Need follow-up:");
    if stats.needs_follow_up.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for c in &stats.needs_follow_up {
        let _ = writeln!(out, "  {} - {}", c.name, format_date(c.last_contacted));
    }
    out
}
