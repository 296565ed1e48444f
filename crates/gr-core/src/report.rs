//! Aggregated report structures handed to renderers.
//!
//! All collections are ordered maps and sets so that two runs over the same
//! input produce equal values.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::Session;
use crate::stats::DurationStats;
use crate::types::{AuthorIdentity, RepositoryId, TaskId};

/// Final output of an aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateReport {
    pub repositories: BTreeMap<RepositoryId, RepositoryReport>,
    pub totals: GlobalTotals,
    pub diagnostics: Diagnostics,
}

impl AggregateReport {
    /// Returns true if no commit survived filtering.
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Iterates over every session of every developer in every repository.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.repositories
            .values()
            .flat_map(|r| r.developers.values())
            .flat_map(|d| d.sessions.iter())
    }
}

/// Everything computed for one repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepositoryReport {
    pub summary: RepositorySummary,
    pub developers: BTreeMap<AuthorIdentity, DeveloperStats>,
    pub tasks: BTreeMap<TaskId, TaskStats>,
}

/// Repository totals only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RepositorySummary {
    pub developer_count: usize,
    pub total_hours: f64,
    pub unique_task_count: usize,
    pub session_count: usize,
    pub commit_count: usize,
}

/// Per-developer detail within one repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperStats {
    pub author: AuthorIdentity,
    pub total_hours: f64,
    pub unique_task_count: usize,
    pub session_count: usize,
    pub commit_count: usize,
    pub session_stats: DurationStats,
    pub tasks: BTreeSet<TaskId>,
    pub sessions: Vec<Session>,
    pub first_commit: DateTime<Utc>,
    pub last_commit: DateTime<Utc>,
}

/// Who touched a task, and how much time went into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStats {
    pub task: TaskId,
    pub hours: f64,
    pub commit_count: usize,
    /// Hours attributed to each developer.
    pub developers: BTreeMap<AuthorIdentity, f64>,
}

/// Totals across every repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GlobalTotals {
    pub repository_count: usize,
    /// Distinct identities across repositories.
    pub developer_count: usize,
    pub total_hours: f64,
    /// Distinct task IDs across repositories.
    pub unique_task_count: usize,
    pub session_count: usize,
    pub commit_count: usize,
    pub session_stats: DurationStats,
}

/// Records that did not contribute to the report, and why.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// `invalid_timestamps + malformed_records`.
    pub skipped: usize,
    pub invalid_timestamps: usize,
    pub malformed_records: usize,
    pub excluded_commits: usize,
    pub out_of_range_commits: usize,
}

impl Diagnostics {
    /// Returns true if any record was left out for any reason.
    pub const fn has_exclusions(&self) -> bool {
        self.skipped > 0 || self.excluded_commits > 0 || self.out_of_range_commits > 0
    }
}
