//! Contact Domain Types
//!
//! The contact record, its category enumeration, the closed set of list orderings,
//! and the statistics summary.

use chrono::{Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ContactError, Result};
use crate::validate::{validate_email, validate_name, validate_phone};

/// Number of contacts reported as "recently added"
pub const RECENT_LIMIT: usize = 5;

/// Contacts not reached within this many months need a follow-up
pub const FOLLOW_UP_MONTHS: u32 = 6;

/// Column widths of the `PostgreSQL` table, enforced for every engine
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 100;

/// Contact category (fixed enumeration, enforced by a CHECK constraint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Friend,
    Family,
    Work,
    Other,
}

impl Category {
    /// All categories in menu order
    pub const ALL: [Self; 4] = [Self::Friend, Self::Family, Self::Work, Self::Other];

    /// Stored representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Friend => "friend",
            Self::Family => "family",
            Self::Work => "work",
            Self::Other => "other",
        }
    }

    /// Capitalized label for display
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Friend => "Friend",
            Self::Family => "Family",
            Self::Work => "Work",
            Self::Other => "Other",
        }
    }

    /// Case-insensitive lookup; surrounding whitespace is ignored
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == lowered)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| {
            ContactError::validation(format!(
                "Unknown category '{s}'. Choose one of: friend, family, work, other"
            ))
        })
    }
}

/// A stored contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Auto-assigned, never reused
    pub id: i64,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub category: Category,
    /// Set by the store at insertion
    pub created_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_contacted: Option<NaiveDate>,
}

/// A contact about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub category: Category,
    pub last_contacted: Option<NaiveDate>,
}

impl NewContact {
    /// Create a contact with only the required fields
    pub fn new(name: impl Into<String>, phone: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: None,
            category,
            last_contacted: None,
        }
    }

    /// Set the email; an empty string means "no email"
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        self.email = if email.is_empty() { None } else { Some(email) };
        self
    }

    #[must_use]
    pub fn with_last_contacted(mut self, date: NaiveDate) -> Self {
        self.last_contacted = Some(date);
        self
    }

    /// Trim fields, drop an empty email, then check every field.
    ///
    /// Returns a `Validation` error naming the first bad field.
    pub fn validate(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self.email = self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());

        if !validate_name(&self.name) {
            return Err(ContactError::validation("Name cannot be empty"));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(ContactError::validation(format!(
                "Name is longer than {MAX_NAME_LEN} characters"
            )));
        }
        if !validate_phone(&self.phone) {
            return Err(ContactError::validation(format!(
                "Invalid phone '{}': expected 7-15 digits, optionally prefixed with '+'",
                self.phone
            )));
        }
        if let Some(email) = &self.email {
            if !validate_email(email) {
                return Err(ContactError::validation(format!("Invalid email '{email}'")));
            }
            if email.chars().count() > MAX_EMAIL_LEN {
                return Err(ContactError::validation(format!(
                    "Email is longer than {MAX_EMAIL_LEN} characters"
                )));
            }
        }
        Ok(self)
    }
}

/// Closed set of list orderings
///
/// Each variant maps to a fixed `ORDER BY` fragment; user input never reaches the SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    NewestFirst,
    OldestFirst,
    Category,
}

impl SortOrder {
    /// Menu order, keys "1" through "5"
    pub const ALL: [Self; 5] =
        [Self::NameAsc, Self::NameDesc, Self::NewestFirst, Self::OldestFirst, Self::Category];

    /// Map a menu key to an ordering. Unknown and empty keys fall back to name ascending.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "2" => Self::NameDesc,
            "3" => Self::NewestFirst,
            "4" => Self::OldestFirst,
            "5" => Self::Category,
            _ => Self::NameAsc,
        }
    }

    /// Menu label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NameAsc => "Name A-Z",
            Self::NameDesc => "Name Z-A",
            Self::NewestFirst => "Newest First",
            Self::OldestFirst => "Oldest First",
            Self::Category => "Category",
        }
    }

    /// Fixed `ORDER BY` fragment (valid for both engines)
    #[must_use]
    pub const fn order_by(&self) -> &'static str {
        match self {
            Self::NameAsc => "name ASC, id ASC",
            Self::NameDesc => "name DESC, id DESC",
            Self::NewestFirst => "created_at DESC, id DESC",
            Self::OldestFirst => "created_at ASC, id ASC",
            Self::Category => "category ASC, name ASC, id ASC",
        }
    }
}

/// Summary returned by the stats operation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactStats {
    pub total: i64,
    /// Only categories with at least one contact, in category order
    pub by_category: Vec<(Category, i64)>,
    /// Most recently created first, at most [`RECENT_LIMIT`]
    pub recent: Vec<Contact>,
    /// Never contacted, or last contacted before the follow-up cutoff
    pub needs_follow_up: Vec<Contact>,
}

/// Earliest `last_contacted` date that does not need a follow-up
///
/// Six calendar months before `today`, clamped to the end of shorter months
/// (2024-08-31 gives 2024-02-29).
#[must_use]
pub fn follow_up_cutoff(today: NaiveDate) -> NaiveDate {
    today.checked_sub_months(Months::new(FOLLOW_UP_MONTHS)).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_round_trip_names() {
        for category in Category::ALL {
            assert_eq!(Category::from_name(category.as_str()), Some(category));
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!(Category::from_name("  WoRk "), Some(Category::Work));
        assert!("buddy".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serialization() {
        assert_eq!(serde_json::to_string(&Category::Family).unwrap(), r#""family""#);
        assert_eq!(serde_json::from_str::<Category>(r#""other""#).unwrap(), Category::Other);
    }

    #[test]
    fn test_sort_order_keys() {
        assert_eq!(SortOrder::from_key("1"), SortOrder::NameAsc);
        assert_eq!(SortOrder::from_key("2"), SortOrder::NameDesc);
        assert_eq!(SortOrder::from_key("3"), SortOrder::NewestFirst);
        assert_eq!(SortOrder::from_key("4"), SortOrder::OldestFirst);
        assert_eq!(SortOrder::from_key(" 5 "), SortOrder::Category);
    }

    #[test]
    fn test_sort_order_unknown_key_falls_back() {
        assert_eq!(SortOrder::from_key(""), SortOrder::NameAsc);
        assert_eq!(SortOrder::from_key("9"), SortOrder::NameAsc);
        assert_eq!(SortOrder::from_key("name; DROP TABLE contacts"), SortOrder::NameAsc);
    }

    #[test]
    fn test_sort_order_fragments_are_fixed() {
        for order in SortOrder::ALL {
            let fragment = order.order_by();
            assert!(fragment.chars().all(|c| c.is_ascii_alphanumeric() || " _,".contains(c)));
        }
    }

    #[test]
    fn test_new_contact_validate_normalizes() {
        let contact = NewContact::new("  Alice ", " 5551234567 ", Category::Friend)
            .with_email("   ")
            .validate()
            .unwrap();
        assert_eq!(contact.name, "Alice");
        assert_eq!(contact.phone, "5551234567");
        assert_eq!(contact.email, None);
    }

    #[test]
    fn test_new_contact_validate_rejects_bad_fields() {
        let err = NewContact::new("", "5551234567", Category::Work).validate().unwrap_err();
        assert!(err.message().contains("Name cannot be empty"));

        let err = NewContact::new("Bob", "12-34", Category::Work).validate().unwrap_err();
        assert!(err.message().contains("Invalid phone"));

        let err = NewContact::new("Bob", "5551234567", Category::Work)
            .with_email("bob@nowhere")
            .validate()
            .unwrap_err();
        assert!(err.message().contains("Invalid email"));

        let err = NewContact::new("x".repeat(MAX_NAME_LEN + 1), "5551234567", Category::Work)
            .validate()
            .unwrap_err();
        assert!(err.message().contains("longer than 100"));
    }

    #[test]
    fn test_with_email_empty_means_none() {
        let contact = NewContact::new("Carol", "5550000000", Category::Other).with_email("");
        assert_eq!(contact.email, None);
    }

    #[test]
    fn test_follow_up_cutoff() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(follow_up_cutoff(today), NaiveDate::from_ymd_opt(2026, 4, 17).unwrap());

        let end_of_month = NaiveDate::from_ymd_opt(2024, 8, 31).unwrap();
        assert_eq!(follow_up_cutoff(end_of_month), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
