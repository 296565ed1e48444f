//! Core type definitions with validation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty (or only whitespace).
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// Generates a validated string ID newtype with common trait implementations.
///
/// The `$normalize` function is applied before the emptiness check.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal, $normalize:path
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after normalization and validation.
            pub fn new(id: impl AsRef<str>) -> Result<Self, ValidationError> {
                let id = $normalize(id.as_ref());
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

/// Trims and collapses internal whitespace runs to a single space.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn trim(s: &str) -> String {
    s.trim().to_string()
}

fn uppercase(s: &str) -> String {
    s.trim().to_uppercase()
}

define_string_id!(
    /// A normalized developer identity (name or email).
    ///
    /// Surrounding whitespace is trimmed and internal whitespace runs collapse
    /// to a single space, so `"Ana  Ruiz "` and `"Ana Ruiz"` are one developer.
    /// Case is preserved for display.
    AuthorIdentity, "author identity", collapse_whitespace
);

define_string_id!(
    /// A repository name, usually the work tree's directory basename.
    RepositoryId, "repository", trim
);

define_string_id!(
    /// A task key extracted from a commit message, always uppercase.
    TaskId, "task ID", uppercase
);

/// A commit as seen by the aggregation engine.
///
/// This trait allows aggregation to work with different commit representations
/// (e.g., `LogEntry` from gr-git with its raw date string, or test fixtures).
pub trait RawCommit {
    /// Returns the repository the commit was read from.
    fn repository(&self) -> &str;

    /// Returns the raw author string (name or email).
    fn author(&self) -> &str;

    /// Returns another identifier for the same author, if the source has one.
    ///
    /// Only consulted when matching excluded authors; sessions are always
    /// grouped by [`RawCommit::author`].
    fn author_alias(&self) -> Option<&str> {
        None
    }

    /// Returns the commit instant, or `None` if the source timestamp could not be parsed.
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    /// Returns the full commit message.
    fn message(&self) -> &str;
}

/// An immutable, already-parsed commit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub repository: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl CommitRecord {
    pub fn new(
        repository: impl Into<String>,
        author: impl Into<String>,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            author: author.into(),
            timestamp,
            message: message.into(),
        }
    }
}

impl RawCommit for CommitRecord {
    fn repository(&self) -> &str {
        &self.repository
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.timestamp)
    }

    fn message(&self) -> &str {
        &self.message
    }
}
