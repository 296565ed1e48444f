//! Report command: reads repositories, aggregates and renders.
//!
//! All configuration is validated before any repository is touched, so a bad
//! task pattern or date range fails fast without running `git`.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use gr_core::{
    AggregateConfig, AggregateReport, DateRange, ExcludedAuthors, SessionConfig, TaskPattern,
    aggregate,
};
use gr_git::{LogOptions, discover_repositories, read_all};

use crate::cli::{Cli, OutputFormat};
use crate::commands::render::{format_csv, format_json, format_terminal};
use crate::commands::util::{Bound, parse_datetime};
use crate::config::Config;

/// Byte order mark so spreadsheet applications detect UTF-8.
const UTF8_BOM: &str = "\u{feff}";

// ========== Configuration ==========

/// Builds validated engine inputs from configuration and flags.
pub fn build_aggregate_config(cli: &Cli, config: &Config) -> Result<AggregateConfig> {
    let since = cli
        .since
        .as_deref()
        .map(|s| parse_datetime(s, Bound::Start))
        .transpose()
        .context("invalid --since")?;
    let until = cli
        .until
        .as_deref()
        .map(|s| parse_datetime(s, Bound::End))
        .transpose()
        .context("invalid --until")?;

    let date_range = DateRange::new(since, until)?;
    let task_pattern = TaskPattern::new(&config.task_pattern)?;
    let sessions = SessionConfig::from_minutes(
        i64::from(config.gap_threshold_minutes),
        i64::from(config.min_session_minutes),
    )?;
    let excluded = load_externals(&config.externals_file)?;

    Ok(AggregateConfig {
        date_range,
        excluded,
        task_pattern,
        sessions,
    })
}

/// Loads the external developers list. A missing file means nobody is excluded.
pub fn load_externals(path: &Path) -> Result<ExcludedAuthors> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no externals file");
            return Ok(ExcludedAuthors::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let excluded = ExcludedAuthors::parse(&text)
        .with_context(|| format!("invalid externals file {}", path.display()))?;
    tracing::info!(count = excluded.len(), path = %path.display(), "loaded external developers");
    Ok(excluded)
}

// ========== Collection ==========

/// Discovers, optionally updates, and reads every repository under `cli.path`.
pub fn collect(cli: &Cli, config: &Config, aggregate_config: &AggregateConfig) -> Result<AggregateReport> {
    let repositories = discover_repositories(&cli.path)
        .with_context(|| format!("failed to scan {}", cli.path.display()))?;
    if repositories.is_empty() {
        bail!("no git repositories found in {}", cli.path.display());
    }
    tracing::info!(count = repositories.len(), "found repositories");

    if cli.update {
        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        for repo in &repositories {
            if let Err(e) = repo.fetch(timeout) {
                tracing::warn!(repository = %repo.name(), error = %e, "failed to update repository");
            }
        }
    }

    let options = LogOptions {
        all_refs: config.all_refs,
        identity: config.identity,
    };
    // read_all logs each failure.
    let outcome = read_all(&repositories, &options);
    if outcome.failures.len() == repositories.len() {
        bail!("none of the {} repositories could be read", repositories.len());
    }

    Ok(aggregate(&outcome.entries, aggregate_config))
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run(cli: &Cli, config: &Config) -> Result<()> {
    let started = Instant::now();
    let aggregate_config = build_aggregate_config(cli, config)?;
    let report = collect(cli, config, &aggregate_config)?;
    let generated_at = Utc::now();

    match cli.output {
        OutputFormat::Terminal => {
            print!("{}", format_terminal(&report, cli.report_type, generated_at));
        }
        OutputFormat::Json => {
            println!("{}", format_json(&report, cli.report_type, generated_at)?);
        }
        OutputFormat::Csv => {
            let csv = format_csv(&report, cli.report_type);
            std::fs::write(&config.csv_file, format!("{UTF8_BOM}{csv}"))
                .with_context(|| format!("failed to write {}", config.csv_file.display()))?;
            eprintln!("Report saved to {}", config.csv_file.display());
        }
    }

    tracing::info!(elapsed_ms = started.elapsed().as_millis(), "report complete");
    Ok(())
}
