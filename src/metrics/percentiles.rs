use std::time::Duration;

use serde::{Deserialize, Serialize};

/// `p`-th percentile of `data`, which need not be sorted. Zero is the
/// minimum and 50 the median; empty input yields zero.
#[must_use]
pub fn percentile(p: u8, data: &[Duration]) -> Duration {
    let mut sorted = data.to_vec();
    sorted.sort_unstable();
    percentile_sorted(p, &sorted)
}

#[must_use]
pub fn median(data: &[Duration]) -> Duration {
    percentile(50, data)
}

pub(crate) fn percentile_sorted(p: u8, sorted: &[Duration]) -> Duration {
    match p {
        0 => sorted.first().copied().unwrap_or_default(),
        50 => median_sorted(sorted),
        _ => {
            let last = u64::try_from(sorted.len().saturating_sub(1)).unwrap_or(u64::MAX);
            let index = last.saturating_mul(u64::from(p.min(100))).div_ceil(100);
            usize::try_from(index)
                .ok()
                .and_then(|index| sorted.get(index))
                .copied()
                .unwrap_or_default()
        }
    }
}

fn median_sorted(sorted: &[Duration]) -> Duration {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        return sorted.get(mid).copied().unwrap_or_default();
    }
    match (sorted.get(mid.wrapping_sub(1)), sorted.get(mid)) {
        (Some(lower), Some(upper)) => lower
            .saturating_add(*upper)
            .checked_div(2)
            .unwrap_or_default(),
        _ => Duration::ZERO,
    }
}

/// The latency figures every report shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentileSet {
    #[serde(with = "super::serde_nanos")]
    pub min: Duration,
    #[serde(with = "super::serde_nanos")]
    pub median: Duration,
    #[serde(with = "super::serde_nanos")]
    pub p75: Duration,
    #[serde(with = "super::serde_nanos")]
    pub p90: Duration,
    #[serde(with = "super::serde_nanos")]
    pub p95: Duration,
    #[serde(with = "super::serde_nanos")]
    pub p99: Duration,
}

impl PercentileSet {
    #[must_use]
    pub fn from_durations(data: &[Duration]) -> Self {
        let mut sorted = data.to_vec();
        sorted.sort_unstable();
        Self::from_sorted(&sorted)
    }

    pub(crate) fn from_sorted(sorted: &[Duration]) -> Self {
        Self {
            min: percentile_sorted(0, sorted),
            median: percentile_sorted(50, sorted),
            p75: percentile_sorted(75, sorted),
            p90: percentile_sorted(90, sorted),
            p95: percentile_sorted(95, sorted),
            p99: percentile_sorted(99, sorted),
        }
    }
}
