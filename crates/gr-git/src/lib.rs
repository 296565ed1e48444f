//! Git repository source for git-report.
//!
//! Discovers work trees, optionally fetches their remotes, and reads commit
//! history through the `git` executable. Entries implement
//! [`gr_core::RawCommit`] and feed straight into [`gr_core::aggregate`].

use std::path::PathBuf;

use thiserror::Error;

mod log;
mod repository;

pub use log::{IdentityKey, LOG_FORMAT, LogEntry, parse_log};
pub use repository::{GitRepository, LogOptions, ReadOutcome, discover_repositories, read_all};

/// Errors from reading repositories.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("{command} failed in {repository} ({status}): {stderr}")]
    CommandFailed {
        command: String,
        repository: String,
        status: String,
        stderr: String,
    },

    #[error("timed out after {seconds}s updating {repository}")]
    Timeout { repository: String, seconds: u64 },
}
