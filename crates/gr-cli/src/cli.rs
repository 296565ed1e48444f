//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use gr_git::IdentityKey;
use serde::Serialize;

/// Work-hours report for git repositories.
///
/// Splits each developer's commits into work sessions, estimates hours worked
/// and groups the time by task keys found in commit messages.
#[derive(Debug, Parser)]
#[command(name = "git-report", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// A repository, or a directory whose subdirectories are repositories.
    pub path: PathBuf,

    /// Which report to produce.
    #[arg(short = 't', long, value_enum, default_value_t = ReportType::Summary)]
    pub report_type: ReportType,

    /// Where to send the report.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub output: OutputFormat,

    /// Fetch all remotes and tags before reading history.
    #[arg(short, long)]
    pub update: bool,

    /// CSV file written with `--output csv`.
    #[arg(long)]
    pub csv_file: Option<PathBuf>,

    /// File listing external developers to exclude, one name or email per line.
    #[arg(long)]
    pub externals_file: Option<PathBuf>,

    /// Regex matching task keys in commit messages.
    #[arg(long)]
    pub task_pattern: Option<String>,

    /// Largest gap between commits of one session.
    #[arg(long, value_name = "MINUTES")]
    pub gap_threshold: Option<u32>,

    /// Minimum hours credited to a session, in minutes.
    #[arg(long, value_name = "MINUTES")]
    pub min_session: Option<u32>,

    /// Only count commits at or after this time (ISO 8601, YYYY-MM-DD, or '2 weeks ago').
    #[arg(long)]
    pub since: Option<String>,

    /// Only count commits at or before this time (ISO 8601, YYYY-MM-DD, or '2 weeks ago').
    #[arg(long)]
    pub until: Option<String>,

    /// Identify developers by author name or email.
    #[arg(long)]
    pub identity: Option<IdentityKey>,

    /// Read every ref instead of local branches only.
    #[arg(long)]
    pub all_refs: bool,

    /// Seconds allowed per repository for `--update`.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// Report views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    /// Totals per repository.
    Summary,
    /// Per-developer hours, tasks and session statistics.
    Detailed,
    /// Hours and developers per task.
    Tasks,
}

/// Output destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table on stdout.
    Terminal,
    /// CSV file.
    Csv,
    /// JSON on stdout.
    Json,
}
