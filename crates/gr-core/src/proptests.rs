//! Property-based tests for segmentation, statistics and aggregation.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use crate::aggregate::{AggregateConfig, aggregate};
    use crate::config::ExcludedAuthors;
    use crate::session::{SessionConfig, segment};
    use crate::stats::summarize;
    use crate::types::CommitRecord;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    /// Minute offsets spread over roughly two weeks.
    fn timestamps() -> impl Strategy<Value = Vec<DateTime<Utc>>> {
        prop::collection::vec(0i64..20_000, 1..60)
            .prop_map(|mins| mins.into_iter().map(|m| base() + Duration::minutes(m)).collect())
    }

    fn commits() -> impl Strategy<Value = Vec<CommitRecord>> {
        let one = (
            prop::sample::select(vec!["api", "web"]),
            prop::sample::select(vec!["Ana", "Ben", "bot"]),
            0i64..5_000,
            prop::sample::select(vec!["ABC-1 work", "def-22", "no task", "XY-3 and ABC-1"]),
        )
            .prop_map(|(repo, author, mins, msg)| {
                CommitRecord::new(repo, author, base() + Duration::minutes(mins), msg)
            });
        prop::collection::vec(one, 0..80)
    }

    // ============================================================================
    // segment
    // ============================================================================

    proptest! {
        /// Property: every timestamp falls in exactly one session
        #[test]
        fn segment_covers_each_timestamp_once(ts in timestamps(), gap in 0i64..600) {
            let config = SessionConfig::from_minutes(gap, 30).unwrap();
            let sessions = segment(&ts, &config);

            for t in &ts {
                let hits = sessions.iter().filter(|s| s.contains(*t)).count();
                prop_assert_eq!(hits, 1, "timestamp {} in {} sessions", t, hits);
            }
            prop_assert_eq!(sessions.iter().map(|s| s.commit_count).sum::<usize>(), ts.len());
        }

        /// Property: sessions are ordered, disjoint and separated by more than the gap
        #[test]
        fn segment_is_maximal(ts in timestamps(), gap in 0i64..600) {
            let config = SessionConfig::from_minutes(gap, 30).unwrap();
            let sessions = segment(&ts, &config);

            for s in &sessions {
                prop_assert!(s.start <= s.end);
                prop_assert!(s.estimated_hours >= config.min_session_hours());
            }
            for pair in sessions.windows(2) {
                prop_assert!(pair[1].start - pair[0].end > config.gap_threshold());
            }
        }
    }

    // ============================================================================
    // summarize
    // ============================================================================

    proptest! {
        /// Property: median and p90 stay within the sample's range
        #[test]
        fn summary_within_bounds(values in prop::collection::vec(0.0f64..100.0, 1..50)) {
            let stats = summarize(&values);
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            prop_assert!(min <= stats.median && stats.median <= max);
            prop_assert!(min <= stats.p90 && stats.p90 <= max);
            prop_assert!(stats.median <= stats.p90 + 1e-9);
        }

        /// Property: mean is the arithmetic average
        #[test]
        fn summary_mean_is_average(values in prop::collection::vec(0.0f64..100.0, 1..50)) {
            let stats = summarize(&values);
            #[allow(clippy::cast_precision_loss)]
            let expected = values.iter().sum::<f64>() / values.len() as f64;
            prop_assert!((stats.mean - expected).abs() < 1e-9);
        }
    }

    // ============================================================================
    // aggregate
    // ============================================================================

    proptest! {
        /// Property: aggregate is deterministic
        #[test]
        fn aggregate_is_idempotent(input in commits()) {
            let config = AggregateConfig::default();
            prop_assert_eq!(aggregate(&input, &config), aggregate(&input, &config));
        }

        /// Property: excluded authors never appear in the report
        #[test]
        fn excluded_authors_never_reported(input in commits()) {
            let config = AggregateConfig {
                excluded: ExcludedAuthors::parse("BOT").unwrap(),
                ..AggregateConfig::default()
            };
            let report = aggregate(&input, &config);
            let bot_commits = input.iter().filter(|c| c.author == "bot").count();

            prop_assert_eq!(report.diagnostics.excluded_commits, bot_commits);
            prop_assert!(report.sessions().all(|s| s.author.as_str() != "bot"));
            for repo in report.repositories.values() {
                for task in repo.tasks.values() {
                    prop_assert!(task.developers.keys().all(|a| a.as_str() != "bot"));
                }
            }
        }

        /// Property: developer hours equal the sum of their sessions
        #[test]
        fn developer_hours_match_sessions(input in commits()) {
            let report = aggregate(&input, &AggregateConfig::default());
            for repo in report.repositories.values() {
                for dev in repo.developers.values() {
                    let sum: f64 = dev.sessions.iter().map(|s| s.estimated_hours).sum();
                    prop_assert!((sum - dev.total_hours).abs() < 1e-9);
                    let task_hours: f64 = repo
                        .tasks
                        .values()
                        .filter_map(|t| t.developers.get(&dev.author))
                        .sum();
                    prop_assert!(task_hours <= dev.total_hours + 1e-9);
                }
            }
        }
    }
}
