//! # Resource Models
//!
//! Typed inputs and validation rules for bootcamps, courses, reviews and
//! users. Request bodies are deserialized into the `*Input` structs, checked,
//! and turned into store documents.

pub mod bootcamp;
pub mod course;
pub mod review;
pub mod user;

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use bootcamp::{BootcampInput, CAREERS};
pub use course::{CourseInput, SKILL_LEVELS};
pub use review::ReviewInput;
pub use user::{Role, UserInput};

/// One or more rejected fields, messages joined by `", "`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Collects validation messages for one document
#[derive(Debug, Default)]
pub(crate) struct Validator {
    messages: Vec<String>,
}

impl Validator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `message` unless `ok`
    pub(crate) fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.messages.push(message.into());
        }
    }

    /// Required text field: present and not blank
    pub(crate) fn require_text(&mut self, value: &Option<String>, message: &str) {
        self.check(
            value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false),
            message,
        );
    }

    pub(crate) fn max_len(&mut self, value: &Option<String>, max: usize, message: &str) {
        if let Some(v) = value {
            self.check(v.chars().count() <= max, message);
        }
    }

    pub(crate) fn finish(self) -> Result<(), ValidationError> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(self.messages.join(", ")))
        }
    }
}

/// Deserialize a request body into a model input
pub fn parse_input<T: DeserializeOwned>(body: Value) -> Result<T, ValidationError> {
    serde_json::from_value(body).map_err(|e| ValidationError(format!("Invalid input: {}", e)))
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^\w+([\.-]?\w+)*@\w+([\.-]?\w+)*(\.\w{2,3})+$").ok())
        .as_ref()
}

fn website_regex() -> Option<&'static Regex> {
    static WEBSITE: OnceLock<Option<Regex>> = OnceLock::new();
    WEBSITE
        .get_or_init(|| {
            Regex::new(
                r"https?://(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&//=]*)",
            )
            .ok()
        })
        .as_ref()
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().map(|re| re.is_match(email)).unwrap_or(false)
}

pub fn is_valid_website(url: &str) -> bool {
    website_regex().map(|re| re.is_match(url)).unwrap_or(false)
}
