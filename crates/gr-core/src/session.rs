//! Work session segmentation.
//!
//! Commits are a proxy for activity, not a clock. A developer's sorted commit
//! timestamps are split wherever two consecutive commits are further apart
//! than the gap threshold; each run becomes one session.
//!
//! # Algorithm Summary
//!
//! 1. Sort timestamps ascending
//! 2. Extend the open session while `t - end <= gap_threshold`, otherwise start a new one
//! 3. Estimate hours as `max(min_session, end - start)` so single-commit
//!    sessions still count for some work

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::types::{AuthorIdentity, RepositoryId};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Configuration for session segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Largest gap between two commits that still belongs to the same session.
    /// Default: 3 hours.
    gap_threshold: Duration,

    /// Floor applied to every session's estimated length.
    /// Default: 30 minutes.
    min_session: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gap_threshold: Duration::hours(3),
            min_session: Duration::minutes(30),
        }
    }
}

impl SessionConfig {
    /// Creates a configuration, rejecting negative durations.
    pub fn new(gap_threshold: Duration, min_session: Duration) -> Result<Self, ConfigError> {
        if gap_threshold < Duration::zero() {
            return Err(ConfigError::InvalidSessionParameter {
                name: "gap threshold",
                value: gap_threshold.to_string(),
            });
        }
        if min_session < Duration::zero() {
            return Err(ConfigError::InvalidSessionParameter {
                name: "minimum session length",
                value: min_session.to_string(),
            });
        }
        Ok(Self {
            gap_threshold,
            min_session,
        })
    }

    /// Creates a configuration from whole minutes.
    ///
    /// Values too large for a [`Duration`] are rejected like negative ones.
    pub fn from_minutes(gap_minutes: i64, min_session_minutes: i64) -> Result<Self, ConfigError> {
        Self::new(
            minutes("gap threshold", gap_minutes)?,
            minutes("minimum session length", min_session_minutes)?,
        )
    }

    pub const fn gap_threshold(&self) -> Duration {
        self.gap_threshold
    }

    pub const fn min_session(&self) -> Duration {
        self.min_session
    }

    /// The floor expressed in hours.
    pub fn min_session_hours(&self) -> f64 {
        hours(self.min_session)
    }
}

fn minutes(name: &'static str, value: i64) -> Result<Duration, ConfigError> {
    Duration::try_minutes(value).ok_or_else(|| ConfigError::InvalidSessionParameter {
        name,
        value: format!("{value} minutes"),
    })
}

/// One contiguous run of commits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub commit_count: usize,
    pub estimated_hours: f64,
}

impl SessionSpan {
    /// Raw span between first and last commit, before the floor.
    pub fn raw_duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if `ts` lies within `[start, end]`.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// A session attributed to a developer in a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub author: AuthorIdentity,
    pub repository: RepositoryId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub commit_count: usize,
    pub estimated_hours: f64,
}

impl Session {
    pub fn from_span(author: AuthorIdentity, repository: RepositoryId, span: SessionSpan) -> Self {
        Self {
            author,
            repository,
            start: span.start,
            end: span.end,
            commit_count: span.commit_count,
            estimated_hours: span.estimated_hours,
        }
    }
}

/// Splits timestamps into sessions, returned in chronological order.
///
/// Input order is not trusted; timestamps are sorted first. Duplicate
/// timestamps have a zero gap and stay in the same session. A gap exactly
/// equal to the threshold does not split.
pub fn segment(timestamps: &[DateTime<Utc>], config: &SessionConfig) -> Vec<SessionSpan> {
    let mut sorted = timestamps.to_vec();
    sorted.sort_unstable();

    let Some((&first, rest)) = sorted.split_first() else {
        return Vec::new();
    };

    let mut sessions = Vec::new();
    let mut start = first;
    let mut end = first;
    let mut commit_count = 1;

    for &ts in rest {
        if ts - end <= config.gap_threshold {
            end = ts;
            commit_count += 1;
        } else {
            sessions.push(close(start, end, commit_count, config));
            start = ts;
            end = ts;
            commit_count = 1;
        }
    }
    sessions.push(close(start, end, commit_count, config));

    sessions
}

fn close(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    commit_count: usize,
    config: &SessionConfig,
) -> SessionSpan {
    SessionSpan {
        start,
        end,
        commit_count,
        estimated_hours: hours(end - start).max(config.min_session_hours()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn hours(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR
}
