//! Field-level validation for record drafts.
//!
//! Validation is pure and runs on every submit attempt before any network
//! call. Each failing field carries one user-facing message.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::RecordDraft;

/// Message shown when the full name is empty.
pub const FULL_NAME_REQUIRED: &str = "Full Name is Required";
/// Message shown when the email is empty or malformed.
pub const INCORRECT_EMAIL_FORMAT: &str = "Incorrect Email Format";
/// Message shown when the password is empty.
pub const PASSWORD_REQUIRED: &str = "Password is Required";

/// Editable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// `fullName`
    FullName,
    /// `email`
    Email,
    /// `password`
    Password,
}

impl Field {
    /// Every editable field in form order.
    pub const ALL: [Self; 3] = [Self::FullName, Self::Email, Self::Password];

    /// Wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::Password => "password",
        }
    }

    /// Read this field from a draft.
    pub fn value(self, draft: &RecordDraft) -> &str {
        match self {
            Self::FullName => draft.full_name.as_str(),
            Self::Email => draft.email.as_str(),
            Self::Password => draft.password.as_str(),
        }
    }

    /// Overwrite this field on a draft.
    pub fn set(self, draft: &mut RecordDraft, value: String) {
        match self {
            Self::FullName => draft.full_name = value,
            Self::Email => draft.email = value,
            Self::Password => draft.password = value,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field error messages; empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationResult(BTreeMap<Field, String>);

impl ValidationResult {
    /// Whether every field passed.
    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    /// Error for `field`, if any.
    pub fn error(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Clear one field's error, leaving the others in place.
    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    /// Fields that currently carry an error.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Alias of [`Self::is_valid`] for collection-style callers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn reject(&mut self, field: Field, message: &str) {
        self.0.insert(field, message.to_owned());
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Local part (dotted atoms or a quoted string), then either a
        // bracketed IPv4 literal or a dotted domain with an alphabetic TLD.
        let pattern = r#"(?i)^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-z\-0-9]+\.)+[a-z]{2,}))$"#;
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Whether `email` has the accepted address shape.
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && email_regex().is_match(email)
}

/// Validate a draft, producing a fresh result.
///
/// # Examples
/// ```
/// use console::domain::{Field, RecordDraft, validate};
///
/// let result = validate(&RecordDraft::new("Ada", "not-an-email", "secret"));
/// assert_eq!(result.error(Field::Email), Some("Incorrect Email Format"));
/// assert_eq!(result.len(), 1);
/// ```
pub fn validate(draft: &RecordDraft) -> ValidationResult {
    let mut result = ValidationResult::default();
    if draft.full_name.is_empty() {
        result.reject(Field::FullName, FULL_NAME_REQUIRED);
    }
    if !is_valid_email(&draft.email) {
        result.reject(Field::Email, INCORRECT_EMAIL_FORMAT);
    }
    if draft.password.is_empty() {
        result.reject(Field::Password, PASSWORD_REQUIRED);
    }
    result
}
