use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::args::NormFactor;

use super::serde_nanos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Inclusive upper bound of the bin.
    #[serde(with = "serde_nanos")]
    pub upper_bound: Duration,
    pub count: u64,
}

/// Latency histogram with Sturges bin count. With a normalization factor the
/// regular bins stop at `nf * fastest`, and everything slower lands in
/// `tail`, keyed at the slowest observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub tail: Option<HistogramBin>,
    pub min_bin_count: u64,
    pub max_bin_count: u64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            bins: Vec::new(),
            tail: None,
            min_bin_count: u64::MAX,
            max_bin_count: 0,
        }
    }
}

impl Histogram {
    /// All bins in ascending order, tail last.
    pub fn iter_bins(&self) -> impl Iterator<Item = &HistogramBin> {
        self.bins.iter().chain(self.tail.iter())
    }

    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.iter_bins()
            .fold(0_u64, |total, bin| total.saturating_add(bin.count))
    }
}

/// Number of bins for `n` observations: `ceil(log2(n + 1))`.
pub(crate) fn sturges_bins(n: usize) -> usize {
    let n = u64::try_from(n).unwrap_or(u64::MAX).saturating_add(1);
    let bits = n.checked_next_power_of_two().map_or(64, u64::trailing_zeros);
    usize::try_from(bits).unwrap_or(usize::MAX)
}

/// Upper end of the regular bins for the given range.
pub(crate) fn effective_max(min: Duration, max: Duration, norm_factor: NormFactor) -> Duration {
    if !norm_factor.is_enabled() {
        return max;
    }
    normalized_max(min, norm_factor).min(max)
}

pub(crate) fn normalized_max(min: Duration, norm_factor: NormFactor) -> Duration {
    let factor = u32::try_from(norm_factor.get()).unwrap_or(u32::MAX);
    min.saturating_mul(factor)
}

/// Bins `timings` (any order). The counts always add up to `timings.len()`.
#[must_use]
pub fn build_histogram(timings: &[Duration], norm_factor: NormFactor) -> Histogram {
    let mut sorted = timings.to_vec();
    sorted.sort_unstable();
    build_histogram_sorted(&sorted, norm_factor)
}

pub(crate) fn build_histogram_sorted(sorted: &[Duration], norm_factor: NormFactor) -> Histogram {
    let (Some(&true_min), Some(&true_max)) = (sorted.first(), sorted.last()) else {
        return Histogram::default();
    };

    let num_bins = sturges_bins(sorted.len()).max(1);
    let upper = effective_max(true_min, true_max, norm_factor);
    let upper_nanos = upper.as_nanos();
    let bins_u128 = u128::try_from(num_bins).unwrap_or(u128::MAX);

    let mut bins: Vec<HistogramBin> = (1..=num_bins)
        .map(|idx| {
            let idx = u128::try_from(idx).unwrap_or(u128::MAX);
            let bound = upper_nanos.saturating_mul(idx) / bins_u128;
            HistogramBin {
                upper_bound: Duration::from_nanos(u64::try_from(bound).unwrap_or(u64::MAX)),
                count: 0,
            }
        })
        .collect();
    let mut tail = (upper < true_max).then_some(HistogramBin {
        upper_bound: true_max,
        count: 0,
    });

    let mut bin_idx = 0_usize;
    for &value in sorted {
        while bins
            .get(bin_idx)
            .is_some_and(|bin| bin.upper_bound < value)
        {
            bin_idx = bin_idx.saturating_add(1);
        }
        match bins.get_mut(bin_idx) {
            Some(bin) => bin.count = bin.count.saturating_add(1),
            None => {
                if let Some(tail) = tail.as_mut() {
                    tail.count = tail.count.saturating_add(1);
                }
            }
        }
    }

    let (min_bin_count, max_bin_count) = bins
        .iter()
        .chain(tail.iter())
        .fold((u64::MAX, 0_u64), |(low, high), bin| {
            (low.min(bin.count), high.max(bin.count))
        });
    Histogram {
        bins,
        tail,
        min_bin_count,
        max_bin_count,
    }
}
