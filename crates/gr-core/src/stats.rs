//! Summary statistics over session durations.
//!
//! # Percentile method
//!
//! Percentiles use linear interpolation between closest ranks (the "type 7"
//! estimator, also the `numpy.percentile` default). For a sorted sample
//! `x[0..n]` and fraction `p`, the rank is `h = p * (n - 1)` and the result is
//! `x[⌊h⌋] + (h - ⌊h⌋) * (x[⌊h⌋ + 1] - x[⌊h⌋])`. The same method is used for
//! every sample size, including samples with fewer than ten values.

use serde::{Deserialize, Serialize};

/// Mean, median and 90th percentile of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub mean: f64,
    pub median: f64,
    pub p90: f64,
}

/// Summarizes `values`. An empty sample gives all zeros.
pub fn summarize(values: &[f64]) -> DurationStats {
    if values.is_empty() {
        return DurationStats::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    DurationStats {
        mean: mean(&sorted),
        median: median(&sorted),
        p90: percentile(&sorted, 0.9),
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(sorted: &[f64]) -> f64 {
    sorted.iter().sum::<f64>() / sorted.len() as f64
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Interpolated percentile of an ascending, non-empty sample. `p` is in `[0, 1]`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted {
        [] => 0.0,
        [only] => *only,
        _ => {
            let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = (lower + 1).min(sorted.len() - 1);
            let frac = rank - rank.floor();
            sorted[lower] + frac * (sorted[upper] - sorted[lower])
        }
    }
}
