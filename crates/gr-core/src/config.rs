//! Validated aggregation inputs: date range and excluded authors.
//!
//! Everything here is checked at construction time so that a bad
//! configuration is rejected before any commit is looked at.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Configuration errors. Raised before aggregation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The start of the date range is after its end.
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The task pattern is not a valid regular expression.
    #[error("invalid task pattern {pattern:?}")]
    InvalidTaskPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// An externals entry could not be used as an identity.
    #[error("invalid externals entry on line {line}: {entry:?}")]
    InvalidExternal { line: usize, entry: String },

    /// A session parameter is out of range.
    #[error("invalid {name}: {value} (must be a non-negative duration)")]
    InvalidSessionParameter { name: &'static str, value: String },
}

/// Inclusive date range. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, ConfigError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ConfigError::InvalidDateRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// A range with no bounds.
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    pub const fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub const fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Returns true if `ts` falls within the range (bounds inclusive).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| ts >= s) && self.end.is_none_or(|e| ts <= e)
    }
}

/// Set of developer identities left out of every metric.
///
/// Entries are stored lowercase and matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedAuthors {
    entries: BTreeSet<String>,
}

impl ExcludedAuthors {
    /// Parses an externals list: one identity per line.
    ///
    /// Blank lines and lines starting with `#` are ignored. Entries are trimmed
    /// and internal whitespace is collapsed, matching [`crate::AuthorIdentity`].
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut entries = BTreeSet::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.chars().any(char::is_control) {
                return Err(ConfigError::InvalidExternal {
                    line: idx + 1,
                    entry: trimmed.to_string(),
                });
            }
            entries.insert(normalize(trimmed));
        }
        Ok(Self { entries })
    }

    /// Builds the set from already-split identities.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for (idx, entry) in entries.into_iter().enumerate() {
            let entry = entry.as_ref().trim();
            if entry.is_empty() || entry.chars().any(char::is_control) {
                return Err(ConfigError::InvalidExternal {
                    line: idx + 1,
                    entry: entry.to_string(),
                });
            }
            set.insert(normalize(entry));
        }
        Ok(Self { entries: set })
    }

    /// Returns true if `author` matches an entry, ignoring case and spacing.
    pub fn contains(&self, author: &str) -> bool {
        !self.entries.is_empty() && self.entries.contains(&normalize(author))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
