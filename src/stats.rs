//! Reduction of raw duration sequences into descriptive summaries.

use serde::{Deserialize, Serialize};

/// Descriptive summary of one phase's duration sequence, in milliseconds.
///
/// Computed once per phase per scenario and never mutated afterward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingStats {
    /// Number of recorded durations.
    pub count: usize,
    /// Arithmetic mean, 0 when empty.
    pub average_ms: f64,
    /// Nearest-rank median: `sorted[count / 2]`.
    pub median_ms: f64,
    /// Nearest-rank 95th percentile: `sorted[floor(count * 0.95)]`.
    pub p95_ms: f64,
    /// Smallest recorded duration, 0 when empty.
    pub min_ms: f64,
    /// Largest recorded duration, 0 when empty.
    pub max_ms: f64,
    /// Population standard deviation (divide by `count`, not `count - 1`).
    pub std_dev_ms: f64,
}

/// Reduce an ordered duration sequence to a [`TimingStats`] summary.
///
/// Pure function: the input is copied and sorted ascending, the original
/// order is irrelevant to every field. Percentiles use nearest-rank
/// indexing without interpolation: `median = sorted[count / 2]` and
/// `p95 = sorted[floor(count * 0.95)]`. For small counts the p95 index
/// lands on the maximum; downstream consumers rely on these exact index
/// semantics, so they are deliberately not the textbook definitions.
///
/// Empty input yields the all-zero struct with `count == 0`.
#[must_use]
pub fn compute_timing_stats(durations: &[f64]) -> TimingStats {
    if durations.is_empty() {
        return TimingStats::default();
    }

    let mut sorted = durations.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();
    let average = sum / count as f64;

    let median = sorted[count / 2];
    let p95 = sorted[((count as f64) * 0.95) as usize];

    let variance = sorted
        .iter()
        .map(|v| {
            let d = v - average;
            d * d
        })
        .sum::<f64>()
        / count as f64;

    TimingStats {
        count,
        average_ms: average,
        median_ms: median,
        p95_ms: p95,
        min_ms: sorted[0],
        max_ms: sorted[count - 1],
        std_dev_ms: variance.sqrt(),
    }
}
