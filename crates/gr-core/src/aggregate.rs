//! Aggregation of commit records into per-repository, per-developer and
//! per-task metrics.
//!
//! # Pipeline
//!
//! 1. Drop records with unparseable timestamps or missing fields (counted)
//! 2. Drop records outside the date range or by excluded authors (counted)
//! 3. Group by repository, then by normalized author
//! 4. Aggregate each repository independently, in parallel
//! 5. Merge repository results and compute global totals

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::config::{DateRange, ExcludedAuthors};
use crate::report::{
    AggregateReport, DeveloperStats, Diagnostics, GlobalTotals, RepositoryReport,
    RepositorySummary, TaskStats,
};
use crate::session::{Session, SessionConfig, segment};
use crate::stats::summarize;
use crate::task::{TaskPattern, extract_task};
use crate::types::{AuthorIdentity, RawCommit, RepositoryId, TaskId};

/// Validated inputs for an aggregation run.
///
/// Every field is built through a checked constructor, so holding an
/// `AggregateConfig` means configuration errors have already been reported.
#[derive(Debug, Clone, Default)]
pub struct AggregateConfig {
    pub date_range: DateRange,
    pub excluded: ExcludedAuthors,
    pub task_pattern: TaskPattern,
    pub sessions: SessionConfig,
}

/// A commit that passed filtering, reduced to what aggregation needs.
#[derive(Debug, Clone)]
struct Accepted {
    timestamp: DateTime<Utc>,
    task: Option<TaskId>,
}

type Grouped = BTreeMap<RepositoryId, BTreeMap<AuthorIdentity, Vec<Accepted>>>;

/// Aggregates `commits` into a report.
///
/// Records with unparseable timestamps or empty repository/author fields are
/// skipped and counted in [`Diagnostics`]; they never abort the run.
pub fn aggregate<C: RawCommit>(commits: &[C], config: &AggregateConfig) -> AggregateReport {
    let (grouped, diagnostics) = filter_and_group(commits, config);

    let repositories: BTreeMap<RepositoryId, RepositoryReport> = grouped
        .into_par_iter()
        .map(|(repository, developers)| {
            let report = aggregate_repository(&repository, developers, &config.sessions);
            (repository, report)
        })
        .collect();

    let totals = global_totals(&repositories);

    tracing::info!(
        repositories = totals.repository_count,
        developers = totals.developer_count,
        sessions = totals.session_count,
        skipped = diagnostics.skipped,
        excluded = diagnostics.excluded_commits,
        "aggregation complete"
    );

    AggregateReport {
        repositories,
        totals,
        diagnostics,
    }
}

fn filter_and_group<C: RawCommit>(commits: &[C], config: &AggregateConfig) -> (Grouped, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let mut grouped = Grouped::new();

    for commit in commits {
        let Some(timestamp) = commit.timestamp() else {
            tracing::debug!(
                repository = commit.repository(),
                author = commit.author(),
                "skipping commit with unparseable timestamp"
            );
            diagnostics.invalid_timestamps += 1;
            continue;
        };

        let (Ok(repository), Ok(author)) = (
            RepositoryId::new(commit.repository()),
            AuthorIdentity::new(commit.author()),
        ) else {
            tracing::debug!(%timestamp, "skipping commit with missing repository or author");
            diagnostics.malformed_records += 1;
            continue;
        };

        if !config.date_range.contains(timestamp) {
            tracing::trace!(%repository, %author, %timestamp, "commit outside date range");
            diagnostics.out_of_range_commits += 1;
            continue;
        }

        let alias_excluded = commit
            .author_alias()
            .is_some_and(|alias| config.excluded.contains(alias));
        if alias_excluded || config.excluded.contains(author.as_str()) {
            tracing::trace!(%repository, %author, "commit by excluded author");
            diagnostics.excluded_commits += 1;
            continue;
        }

        let task = extract_task(commit.message(), &config.task_pattern);
        grouped
            .entry(repository)
            .or_default()
            .entry(author)
            .or_default()
            .push(Accepted { timestamp, task });
    }

    diagnostics.skipped = diagnostics.invalid_timestamps + diagnostics.malformed_records;
    (grouped, diagnostics)
}

fn aggregate_repository(
    repository: &RepositoryId,
    developers: BTreeMap<AuthorIdentity, Vec<Accepted>>,
    config: &SessionConfig,
) -> RepositoryReport {
    let mut report = RepositoryReport::default();

    for (author, commits) in developers {
        let stats = aggregate_developer(repository, &author, commits, config, &mut report.tasks);
        report.developers.insert(author, stats);
    }

    report.summary = RepositorySummary {
        developer_count: report.developers.len(),
        total_hours: report.developers.values().map(|d| d.total_hours).sum(),
        unique_task_count: report.tasks.len(),
        session_count: report.developers.values().map(|d| d.session_count).sum(),
        commit_count: report.developers.values().map(|d| d.commit_count).sum(),
    };

    tracing::debug!(
        %repository,
        developers = report.summary.developer_count,
        hours = report.summary.total_hours,
        "aggregated repository"
    );

    report
}

/// Builds one developer's stats and adds their task time into `tasks`.
///
/// Each session's hours are split evenly among the distinct tasks referenced
/// by commits inside that session. Sessions without a task reference add to
/// no task.
fn aggregate_developer(
    repository: &RepositoryId,
    author: &AuthorIdentity,
    mut commits: Vec<Accepted>,
    config: &SessionConfig,
    tasks: &mut BTreeMap<TaskId, TaskStats>,
) -> DeveloperStats {
    // Stable: equal timestamps keep ingestion order.
    commits.sort_by_key(|c| c.timestamp);

    let timestamps: Vec<DateTime<Utc>> = commits.iter().map(|c| c.timestamp).collect();
    let spans = segment(&timestamps, config);

    let mut remaining = commits.as_slice();
    let mut sessions = Vec::with_capacity(spans.len());
    let mut touched = BTreeSet::new();

    for span in spans {
        let (in_session, rest) = remaining.split_at(span.commit_count);
        remaining = rest;

        let session_tasks: BTreeSet<&TaskId> =
            in_session.iter().filter_map(|c| c.task.as_ref()).collect();

        for commit in in_session {
            if let Some(task) = &commit.task {
                task_entry(tasks, task).commit_count += 1;
            }
        }

        if !session_tasks.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let share = span.estimated_hours / session_tasks.len() as f64;
            for task in &session_tasks {
                let entry = task_entry(tasks, task);
                entry.hours += share;
                *entry.developers.entry(author.clone()).or_insert(0.0) += share;
            }
        }

        touched.extend(session_tasks.into_iter().cloned());
        sessions.push(Session::from_span(author.clone(), repository.clone(), span));
    }

    let hours: Vec<f64> = sessions.iter().map(|s| s.estimated_hours).collect();

    DeveloperStats {
        author: author.clone(),
        total_hours: hours.iter().sum(),
        unique_task_count: touched.len(),
        session_count: sessions.len(),
        commit_count: commits.len(),
        session_stats: summarize(&hours),
        tasks: touched,
        sessions,
        first_commit: timestamps[0],
        last_commit: timestamps[timestamps.len() - 1],
    }
}

fn task_entry<'a>(tasks: &'a mut BTreeMap<TaskId, TaskStats>, task: &TaskId) -> &'a mut TaskStats {
    tasks.entry(task.clone()).or_insert_with(|| TaskStats {
        task: task.clone(),
        hours: 0.0,
        commit_count: 0,
        developers: BTreeMap::new(),
    })
}

fn global_totals(repositories: &BTreeMap<RepositoryId, RepositoryReport>) -> GlobalTotals {
    let mut developers = BTreeSet::new();
    let mut tasks = BTreeSet::new();
    let mut hours = Vec::new();
    let mut commit_count = 0;

    for report in repositories.values() {
        developers.extend(report.developers.keys());
        tasks.extend(report.tasks.keys());
        commit_count += report.summary.commit_count;
        for dev in report.developers.values() {
            hours.extend(dev.sessions.iter().map(|s| s.estimated_hours));
        }
    }

    GlobalTotals {
        repository_count: repositories.len(),
        developer_count: developers.len(),
        total_hours: repositories.values().map(|r| r.summary.total_hours).sum(),
        unique_task_count: tasks.len(),
        session_count: hours.len(),
        commit_count,
        session_stats: summarize(&hours),
    }
}
