//! Parsing of `git log` output.
//!
//! Records are requested with [`LOG_FORMAT`]: fields are separated by the
//! ASCII unit separator (0x1f) and records by the record separator (0x1e),
//! neither of which appears in normal commit metadata.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use gr_core::RawCommit;
use serde::{Deserialize, Serialize};

const FIELD_SEP: char = '\x1f';
const RECORD_SEP: char = '\x1e';

/// `--format` argument understood by [`parse_log`].
///
/// Hash, author name, author email, committer date (strict ISO 8601), raw body.
pub const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%ae%x1f%cI%x1f%B%x1e";

/// Which part of the author signature identifies a developer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKey {
    #[default]
    Name,
    Email,
}

impl IdentityKey {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
        }
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            _ => Err(format!("invalid identity key: {s}")),
        }
    }
}

/// One commit as read from `git log`, before any validation.
///
/// The date is kept as the raw string so that an unparseable value reaches the
/// aggregation engine and is counted there rather than lost here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub hash: String,
    pub repository: String,
    pub author_name: String,
    pub author_email: String,
    pub date: String,
    pub message: String,
    pub identity: IdentityKey,
}

impl RawCommit for LogEntry {
    fn repository(&self) -> &str {
        &self.repository
    }

    fn author(&self) -> &str {
        match self.identity {
            IdentityKey::Name => &self.author_name,
            IdentityKey::Email => &self.author_email,
        }
    }

    /// The field not selected by `identity`, so an externals list written
    /// with names still excludes authors grouped by email and vice versa.
    fn author_alias(&self) -> Option<&str> {
        let alias = match self.identity {
            IdentityKey::Name => &self.author_email,
            IdentityKey::Email => &self.author_name,
        };
        Some(alias.as_str()).filter(|a| !a.trim().is_empty())
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.date.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Parses `git log` output produced with [`LOG_FORMAT`].
///
/// Records with missing fields are still returned (with empty strings) so that
/// the engine counts them as malformed.
pub fn parse_log(repository: &str, output: &str, identity: IdentityKey) -> Vec<LogEntry> {
    output
        .split(RECORD_SEP)
        .filter(|record| !record.trim().is_empty())
        .map(|record| {
            let record = record.trim_start_matches(['\n', '\r']);
            let mut fields = record.splitn(5, FIELD_SEP);
            let mut next = || fields.next().unwrap_or_default().to_string();

            let hash = next();
            let author_name = next();
            let author_email = next();
            let date = next();
            let message = next().trim_end().to_string();

            if message.is_empty() && date.is_empty() {
                tracing::debug!(repository, %hash, "truncated log record");
            }

            LogEntry {
                hash,
                repository: repository.to_string(),
                author_name,
                author_email,
                date,
                message,
                identity,
            }
        })
        .collect()
}
