//! Record data model.

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Validation errors returned by [`RecordId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    EmptyId,
    PaddedId,
}

impl fmt::Display for RecordValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "record id must not be empty"),
            Self::PaddedId => write!(f, "record id must not contain surrounding whitespace"),
        }
    }
}

impl std::error::Error for RecordValidationError {}

/// Server-assigned record identifier.
///
/// The identifier is opaque to the console: it is only ever echoed back to
/// the server to address updates and deletes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Validate and construct a [`RecordId`].
    pub fn new(id: impl Into<String>) -> Result<Self, RecordValidationError> {
        let raw = id.into();
        if raw.trim().is_empty() {
            return Err(RecordValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(RecordValidationError::PaddedId);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = RecordValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// User-editable fields of a record.
///
/// Drafts are what the create and edit dialogs hold and what create and
/// update requests send. They never carry an identifier or timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    /// Full name of the person.
    pub full_name: String,
    /// Contact email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl RecordDraft {
    /// Build a draft from its three fields.
    pub fn new(
        full_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

const DISPLAY_TIMESTAMP_FORMAT: &str = "%d %b %Y %H:%M";

/// A stored record as returned by the remote collection.
///
/// ## Invariants
/// - `id` is assigned by the server and never changes.
/// - `created_at` and `updated_at` are server-assigned and never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    id: RecordId,
    #[serde(flatten)]
    fields: RecordDraft,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Record {
    /// Assemble a stored record.
    pub fn new(
        id: RecordId,
        fields: RecordDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            fields,
            created_at,
            updated_at,
        }
    }

    /// Stable server identifier.
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Full name field.
    pub fn full_name(&self) -> &str {
        self.fields.full_name.as_str()
    }

    /// Email field.
    pub fn email(&self) -> &str {
        self.fields.email.as_str()
    }

    /// Password field.
    pub fn password(&self) -> &str {
        self.fields.password.as_str()
    }

    /// Editable projection used to prefill the edit dialog.
    pub fn draft(&self) -> RecordDraft {
        self.fields.clone()
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Creation timestamp rendered in the local timezone.
    pub fn created_at_display(&self) -> String {
        display_timestamp(self.created_at)
    }

    /// Last update timestamp rendered in the local timezone.
    pub fn updated_at_display(&self) -> String {
        display_timestamp(self.updated_at)
    }

    /// Replace the editable fields, keeping identity and creation time.
    pub fn with_fields(self, fields: RecordDraft, updated_at: DateTime<Utc>) -> Self {
        Self {
            fields,
            updated_at,
            ..self
        }
    }
}

fn display_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format(DISPLAY_TIMESTAMP_FORMAT)
        .to_string()
}
