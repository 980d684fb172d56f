//! Menu Controller
//!
//! Single-threaded request/response loop: print the numbered menu, read a
//! choice, run the action, repeat until the user picks Exit.
//!
//! Every action gathers its input through the [`Console`], validates it, calls the
//! [`ContactRepository`], and prints the result. Errors from an action are
//! reported and the loop continues. Only a console failure (closed terminal,
//! exhausted script) ends the loop early.

use tracing::{debug, warn};

use crate::console::{accept_any, Console};
use crate::contact::{Category, NewContact, SortOrder};
use crate::error::{ContactError, Result};
use crate::output::{
    render_contact_table, render_main_menu, render_search_results, render_sort_menu, render_stats,
};
use crate::repository::ContactRepository;
use crate::validate::{
    parse_contact_date, validate_category, validate_email, validate_name, validate_phone,
};

/// Main menu actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Add,
    View,
    Search,
    Delete,
    Stats,
    Exit,
}

impl MenuChoice {
    /// Map the typed menu number; anything else is `None`
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Add),
            "2" => Some(Self::View),
            "3" => Some(Self::Search),
            "4" => Some(Self::Delete),
            "5" => Some(Self::Stats),
            "6" => Some(Self::Exit),
            _ => None,
        }
    }
}

fn require(ok: bool, message: &str) -> std::result::Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

/// Interactive contact book menu
pub struct Menu<C: Console> {
    repo: ContactRepository,
    console: C,
}

impl<C: Console> Menu<C> {
    pub const fn new(repo: ContactRepository, console: C) -> Self {
        Self { repo, console }
    }

    pub const fn console(&self) -> &C {
        &self.console
    }

    pub fn into_console(self) -> C {
        self.console
    }

    /// Run until the user chooses Exit
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.console.print("");
            self.console.print(&render_main_menu());
            let choice = self.console.input("Choose (1-6)", &accept_any)?;

            let Some(choice) = MenuChoice::parse(&choice) else {
                self.console.print("Invalid choice.");
                continue;
            };

            if choice == MenuChoice::Exit {
                self.console.print("Goodbye!");
                return Ok(());
            }

            debug!(?choice, "menu action");
            if let Err(e) = self.perform(choice).await {
                if matches!(e, ContactError::Console(_)) {
                    return Err(e);
                }
                warn!(code = e.error_code(), "menu action failed");
                self.console.print(&format!("Error: {}", e.message()));
            }
        }
    }

    /// Run one action
    pub async fn perform(&mut self, choice: MenuChoice) -> Result<()> {
        match choice {
            MenuChoice::Add => self.add_contact().await,
            MenuChoice::View => self.view_contacts().await,
            MenuChoice::Search => self.search_contacts().await,
            MenuChoice::Delete => self.delete_contact().await,
            MenuChoice::Stats => self.show_stats().await,
            MenuChoice::Exit => Ok(()),
        }
    }

    async fn add_contact(&mut self) -> Result<()> {
        self.console.print("");
        self.console.print("--- Add New Contact ---");

        let name = self.console.input("Name", &|s: &str| {
            require(validate_name(s), "Name cannot be empty.")
        })?;
        let phone = self.console.input("Phone", &|s: &str| {
            require(validate_phone(s), "Invalid phone. Use 7-15 digits, optionally starting with +.")
        })?;
        let email = self.console.input("Email (optional)", &|s: &str| {
            require(validate_email(s), "Invalid email.")
        })?;

        self.console.print("Categories: friend, family, work, other");
        let category: Category = self
            .console
            .input("Category", &|s: &str| {
                require(validate_category(s), "Choose a valid category.")
            })?
            .parse()?;

        let mut contact = NewContact::new(name, phone, category).with_email(email);
        if self.console.confirm("Add last contacted date?")? {
            let date = self.console.input("Last contacted (YYYY-MM-DD)", &|s: &str| {
                require(parse_contact_date(s).is_some(), "Invalid date format. Use YYYY-MM-DD.")
            })?;
            if let Some(date) = parse_contact_date(&date) {
                contact = contact.with_last_contacted(date);
            }
        }

        match self.repo.add(contact).await {
            Ok(stored) => {
                self.console.print(&format!("Contact '{}' added.", stored.name));
                Ok(())
            }
            Err(ContactError::DuplicatePhone(_)) => {
                self.console.print("Contact with this phone already exists.");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn view_contacts(&mut self) -> Result<()> {
        self.console.print("");
        self.console.print("--- View Contacts ---");
        self.console.print(&render_sort_menu());

        let key = self.console.input("Sort by (1-5)", &accept_any)?;
        let contacts = self.repo.list(SortOrder::from_key(&key)).await?;
        self.console.print(&render_contact_table(&contacts));
        Ok(())
    }

    async fn search_contacts(&mut self) -> Result<()> {
        self.console.print("");
        self.console.print("--- Search Contacts ---");

        let term = self.console.input("Enter name or phone", &accept_any)?;
        if term.is_empty() {
            self.console.print("Search term cannot be empty.");
            return Ok(());
        }

        let results = self.repo.search(&term).await?;
        self.console.print(&render_search_results(&results));
        Ok(())
    }

    async fn delete_contact(&mut self) -> Result<()> {
        self.console.print("");
        self.console.print("--- Delete Contact ---");
        self.view_contacts().await?;

        let answer = self.console.input("Enter ID to delete (0 to cancel)", &accept_any)?;
        let Ok(id) = answer.parse::<i64>() else {
            self.console.print("Invalid number.");
            return Ok(());
        };
        if id == 0 {
            return Ok(());
        }

        let contact = match self.repo.find(id).await {
            Ok(contact) => contact,
            Err(ContactError::NotFound(_)) => {
                self.console.print("No contact with that ID.");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if !self.console.confirm(&format!("Delete '{}'?", contact.name))? {
            return Ok(());
        }

        match self.repo.delete(id).await {
            Ok(name) => {
                self.console.print(&format!("Deleted '{name}'"));
                Ok(())
            }
            Err(ContactError::NotFound(_)) => {
                self.console.print("No contact with that ID.");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn show_stats(&mut self) -> Result<()> {
        self.console.print("");
        self.console.print("--- Contact Stats ---");
        let stats = self.repo.stats().await?;
        self.console.print(&render_stats(&stats));
        Ok(())
    }
}
