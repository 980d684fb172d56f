//! Input Validators
//!
//! Pure, total functions that check field formats. They never prompt and never
//! touch the store; re-prompting on failure belongs to the console.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::contact::Category;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("phone regex"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.+-]+@[\w-]+\.[\w.-]+$").expect("email regex"));

/// Date format accepted for the last-contacted field
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 7 to 15 ASCII digits, optionally prefixed with `+`
#[must_use]
pub fn validate_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Empty means "no email" and is valid; anything else must look like `local@domain.tld`
#[must_use]
pub fn validate_email(email: &str) -> bool {
    email.is_empty() || EMAIL_RE.is_match(email)
}

/// True iff the lowercased input is one of the fixed categories
#[must_use]
pub fn validate_category(category: &str) -> bool {
    Category::from_name(category).is_some()
}

/// Names are required; whitespace alone does not count
#[must_use]
pub fn validate_name(name: &str) -> bool {
    !name.trim().is_empty()
}

/// Parse a `YYYY-MM-DD` date
#[must_use]
pub fn parse_contact_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}
