//! Report rendering: terminal tables, CSV and JSON.
//!
//! Renderers only read an [`AggregateReport`]; every number shown here was
//! computed by the engine. Hours are rounded to two decimals for display.

use std::borrow::Cow;
use std::fmt::Write;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use gr_core::{AggregateReport, Diagnostics, GlobalTotals, RepositoryReport, RepositorySummary};
use serde::Serialize;

use crate::cli::ReportType;
use crate::commands::util::format_hours;

const RULE: &str = "════════════════════════════════════════════════════════════";

/// Developer and task names are cut to this many characters in tables.
const NAME_WIDTH: usize = 20;

/// Developers listed per task before the rest are summarized.
const MAX_TASK_DEVELOPERS: usize = 3;

// ========== Terminal Output ==========

/// Formats a report for the terminal.
pub fn format_terminal(
    report: &AggregateReport,
    report_type: ReportType,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();

    writeln!(output, "GIT REPORT: {}", generated_at.format("%Y-%m-%d %H:%M UTC")).unwrap();
    writeln!(output, "{RULE}").unwrap();

    if report.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No commits found.").unwrap();
    } else {
        for (name, repository) in &report.repositories {
            writeln!(output).unwrap();
            writeln!(output, "REPOSITORY: {name}").unwrap();
            match report_type {
                ReportType::Summary => write_summary_block(&mut output, &repository.summary),
                ReportType::Detailed => write_developer_table(&mut output, repository),
                ReportType::Tasks => write_task_table(&mut output, repository),
            }
        }

        writeln!(output).unwrap();
        write_totals(&mut output, &report.totals);
    }

    if report.diagnostics.has_exclusions() {
        writeln!(output).unwrap();
        writeln!(output, "{}", diagnostics_line(&report.diagnostics)).unwrap();
    }

    writeln!(output, "{RULE}").unwrap();
    output
}

fn write_summary_block(output: &mut String, summary: &RepositorySummary) {
    writeln!(output, "  Developers:    {}", summary.developer_count).unwrap();
    writeln!(output, "  Total hours:   {}", format_hours(summary.total_hours)).unwrap();
    writeln!(output, "  Unique tasks:  {}", summary.unique_task_count).unwrap();
    writeln!(output, "  Sessions:      {}", summary.session_count).unwrap();
}

fn write_developer_table(output: &mut String, repository: &RepositoryReport) {
    let header = format!(
        "  {:<NAME_WIDTH$} {:>7} {:>6} {:>9} {:>6} {:>6} {:>6}",
        "Developer", "Hours", "Tasks", "Sessions", "Avg", "Median", "P90"
    );
    writeln!(output, "{header}").unwrap();
    writeln!(output, "  {}", "-".repeat(header.len() - 2)).unwrap();

    for dev in repository.developers.values() {
        writeln!(
            output,
            "  {:<NAME_WIDTH$} {:>7} {:>6} {:>9} {:>6} {:>6} {:>6}",
            truncate(dev.author.as_str(), NAME_WIDTH),
            format_hours(dev.total_hours),
            dev.unique_task_count,
            dev.session_count,
            format_hours(dev.session_stats.mean),
            format_hours(dev.session_stats.median),
            format_hours(dev.session_stats.p90),
        )
        .unwrap();
    }
}

fn write_task_table(output: &mut String, repository: &RepositoryReport) {
    if repository.tasks.is_empty() {
        writeln!(output, "  (no task references)").unwrap();
        return;
    }

    let header = format!("  {:<NAME_WIDTH$} {:>7}  Developers", "Task", "Hours");
    writeln!(output, "{header}").unwrap();
    writeln!(output, "  {}", "-".repeat(header.len() - 2)).unwrap();

    for task in repository.tasks.values() {
        let names: Vec<&str> = task.developers.keys().map(|a| a.as_str()).collect();
        let mut developers = names
            .iter()
            .take(MAX_TASK_DEVELOPERS)
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        if names.len() > MAX_TASK_DEVELOPERS {
            write!(developers, " +{} more", names.len() - MAX_TASK_DEVELOPERS).unwrap();
        }

        writeln!(
            output,
            "  {:<NAME_WIDTH$} {:>7}  {developers}",
            truncate(task.task.as_str(), NAME_WIDTH),
            format_hours(task.hours),
        )
        .unwrap();
    }
}

fn write_totals(output: &mut String, totals: &GlobalTotals) {
    writeln!(output, "TOTAL").unwrap();
    writeln!(output, "  Repositories:  {}", totals.repository_count).unwrap();
    writeln!(output, "  Developers:    {}", totals.developer_count).unwrap();
    writeln!(output, "  Total hours:   {}", format_hours(totals.total_hours)).unwrap();
    writeln!(output, "  Unique tasks:  {}", totals.unique_task_count).unwrap();
    writeln!(output, "  Sessions:      {}", totals.session_count).unwrap();
    writeln!(
        output,
        "  Session hours: avg {} / median {} / p90 {}",
        format_hours(totals.session_stats.mean),
        format_hours(totals.session_stats.median),
        format_hours(totals.session_stats.p90),
    )
    .unwrap();
}

/// One-line account of records left out of the report.
pub fn diagnostics_line(diagnostics: &Diagnostics) -> String {
    format!(
        "Skipped {} record(s): {} unparseable timestamp(s), {} malformed. \
         Excluded {} commit(s) by external authors, {} outside the date range.",
        diagnostics.skipped,
        diagnostics.invalid_timestamps,
        diagnostics.malformed_records,
        diagnostics.excluded_commits,
        diagnostics.out_of_range_commits,
    )
}

fn truncate(s: &str, width: usize) -> &str {
    s.char_indices().nth(width).map_or(s, |(idx, _)| &s[..idx])
}

// ========== CSV Output ==========

/// Formats a report as CSV, one row per repository, developer or task.
pub fn format_csv(report: &AggregateReport, report_type: ReportType) -> String {
    let mut output = String::new();

    match report_type {
        ReportType::Summary => {
            writeln!(
                output,
                "Repository,Developers,Total Hours,Unique Tasks,Sessions,Commits"
            )
            .unwrap();
            for (name, repository) in &report.repositories {
                let s = &repository.summary;
                writeln!(
                    output,
                    "{},{},{},{},{},{}",
                    csv_field(name.as_str()),
                    s.developer_count,
                    format_hours(s.total_hours),
                    s.unique_task_count,
                    s.session_count,
                    s.commit_count,
                )
                .unwrap();
            }
        }
        ReportType::Detailed => {
            writeln!(
                output,
                "Repository,Developer,Hours,Tasks,Sessions,Avg Session,Median Session,P90 Session,First Commit,Last Commit"
            )
            .unwrap();
            for (name, repository) in &report.repositories {
                for dev in repository.developers.values() {
                    writeln!(
                        output,
                        "{},{},{},{},{},{},{},{},{},{}",
                        csv_field(name.as_str()),
                        csv_field(dev.author.as_str()),
                        format_hours(dev.total_hours),
                        dev.unique_task_count,
                        dev.session_count,
                        format_hours(dev.session_stats.mean),
                        format_hours(dev.session_stats.median),
                        format_hours(dev.session_stats.p90),
                        dev.first_commit.to_rfc3339_opts(SecondsFormat::Secs, true),
                        dev.last_commit.to_rfc3339_opts(SecondsFormat::Secs, true),
                    )
                    .unwrap();
                }
            }
        }
        ReportType::Tasks => {
            writeln!(output, "Repository,Task,Hours,Commits,Developers").unwrap();
            for (name, repository) in &report.repositories {
                for task in repository.tasks.values() {
                    let developers = task
                        .developers
                        .keys()
                        .map(|a| a.as_str())
                        .collect::<Vec<_>>()
                        .join(";");
                    writeln!(
                        output,
                        "{},{},{},{},{}",
                        csv_field(name.as_str()),
                        csv_field(task.task.as_str()),
                        format_hours(task.hours),
                        task.commit_count,
                        csv_field(&developers),
                    )
                    .unwrap();
                }
            }
        }
    }

    output
}

/// Quotes a field if it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub report_type: ReportType,
    #[serde(flatten)]
    pub report: &'a AggregateReport,
}

/// Formats a report as pretty-printed JSON.
pub fn format_json(
    report: &AggregateReport,
    report_type: ReportType,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let json = JsonReport {
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        report_type,
        report,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}
