// src/models.rs

use crate::error::{DiaryError, Result};
use chrono::{DateTime, Utc};

/// A stored diary entry, as seen by the admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: i64,
    pub name: String,
    pub relationship: Option<String>,
    pub thoughts: String,
    pub secret_token: String,
    pub created_at: String, // RFC 3339, UTC
}

/// The display-only projection served on the public reveal page.
/// Never carries the id or the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedEntry {
    pub name: String,
    pub relationship: Option<String>,
    pub thoughts: String,
    pub created_at: String,
}

/// User-editable fields of an entry, trimmed and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub name: String,
    pub relationship: Option<String>,
    pub thoughts: String,
}

impl EntryDraft {
    pub fn new(name: &str, relationship: Option<&str>, thoughts: &str) -> Result<Self> {
        let name = name.trim();
        let thoughts = thoughts.trim();
        if name.is_empty() {
            return Err(DiaryError::InvalidInput("name is required".to_string()));
        }
        if thoughts.is_empty() {
            return Err(DiaryError::InvalidInput("thoughts are required".to_string()));
        }
        let relationship = relationship
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            relationship,
            thoughts: thoughts.to_string(),
        })
    }
}

/// An authenticated admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Formats a stored RFC 3339 timestamp as a calendar date, e.g. "October 16, 2026".
pub fn display_date(timestamp: &str) -> String {
    match timestamp.parse::<DateTime<Utc>>() {
        Ok(dt) => dt.format("%B %-d, %Y").to_string(),
        Err(_) => timestamp.to_string(),
    }
}
