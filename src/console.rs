//! Console Collaborator
//!
//! The menu talks to the user only through the [`Console`] trait. Retry-until-valid
//! prompting lives here, not in the validators: a console keeps asking until the
//! supplied check accepts the line.
//!
//! - [`TerminalConsole`]: interactive terminal via `dialoguer`
//! - [`ScriptedConsole`]: pre-recorded answers with a captured transcript, for
//!   driving the menu without a terminal

use dialoguer::{Confirm, Input, Password};
use std::collections::VecDeque;

use crate::error::{ContactError, Result};

/// Line check: `Err` carries the message shown before asking again
pub type Check<'a> = &'a dyn Fn(&str) -> std::result::Result<(), String>;

/// Accepts every line, including an empty one
pub fn accept_any(_line: &str) -> std::result::Result<(), String> {
    Ok(())
}

/// Prompt/response I/O used by the menu
pub trait Console {
    /// Read one trimmed line that passes `check`, asking again until it does
    fn input(&mut self, prompt: &str, check: Check<'_>) -> Result<String>;

    /// Yes/no question
    fn confirm(&mut self, prompt: &str) -> Result<bool>;

    /// Show text to the user
    fn print(&mut self, text: &str);
}

/// Interactive terminal console
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConsole;

impl TerminalConsole {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Hidden password entry
    pub fn password(&self, prompt: &str) -> Result<String> {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| ContactError::console(e.to_string()))
    }
}

impl Console for TerminalConsole {
    fn input(&mut self, prompt: &str, check: Check<'_>) -> Result<String> {
        let line: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .validate_with(|value: &String| check(value.trim()))
            .interact_text()
            .map_err(|e| ContactError::console(e.to_string()))?;
        Ok(line.trim().to_string())
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| ContactError::console(e.to_string()))
    }

    fn print(&mut self, text: &str) {
        if text.ends_with('\n') {
            print!("{text}");
        } else {
            println!("{text}");
        }
    }
}

/// Console fed from a fixed list of answer lines
///
/// `input` and `confirm` both consume the next line; `confirm` is true for
/// `y`/`yes` (any case). Every prompt, answer, rejection message, and printed
/// text is appended to the transcript. Running out of lines is a `Console` error.
#[derive(Debug, Default, Clone)]
pub struct ScriptedConsole {
    lines: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { lines: lines.into_iter().map(Into::into).collect(), transcript: Vec::new() }
    }

    /// Everything shown so far, one entry per line
    #[must_use]
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Transcript joined into one string
    #[must_use]
    pub fn output(&self) -> String {
        self.transcript.join("\n")
    }

    /// Answers not consumed yet
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }

    fn next_line(&mut self, prompt: &str) -> Result<String> {
        let line = self
            .lines
            .pop_front()
            .ok_or_else(|| ContactError::console(format!("No scripted answer for '{prompt}'")))?;
        self.transcript.push(format!("{prompt}: {line}"));
        Ok(line.trim().to_string())
    }
}

impl Console for ScriptedConsole {
    fn input(&mut self, prompt: &str, check: Check<'_>) -> Result<String> {
        loop {
            let line = self.next_line(prompt)?;
            match check(&line) {
                Ok(()) => return Ok(line),
                Err(message) => self.transcript.push(message),
            }
        }
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let line = self.next_line(&format!("{prompt} (y/n)"))?;
        Ok(matches!(line.to_lowercase().as_str(), "y" | "yes"))
    }

    fn print(&mut self, text: &str) {
        self.transcript.extend(text.lines().map(str::to_string));
    }
}
