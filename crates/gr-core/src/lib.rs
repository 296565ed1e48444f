//! Session segmentation and aggregation engine for git-report.
//!
//! This crate turns commit records into work metrics:
//! - Task extraction: pulling task keys out of commit messages
//! - Session segmentation: splitting a developer's commits into work sessions
//! - Statistics: mean, median and p90 of session lengths
//! - Aggregation: per-repository, per-developer and per-task reports
//!
//! It performs no I/O. Commits come in through the [`RawCommit`] trait and the
//! result is a plain [`AggregateReport`] value.

mod aggregate;
pub mod config;
mod proptests;
pub mod report;
pub mod session;
pub mod stats;
pub mod task;
pub mod types;

pub use aggregate::{AggregateConfig, aggregate};
pub use config::{ConfigError, DateRange, ExcludedAuthors};
pub use report::{
    AggregateReport, DeveloperStats, Diagnostics, GlobalTotals, RepositoryReport,
    RepositorySummary, TaskStats,
};
pub use session::{Session, SessionConfig, SessionSpan, segment};
pub use stats::{DurationStats, summarize};
pub use task::{DEFAULT_TASK_PATTERN, TaskPattern, extract_task};
pub use types::{AuthorIdentity, CommitRecord, RawCommit, RepositoryId, TaskId, ValidationError};
