use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::histogram::Histogram;
use super::percentiles::PercentileSet;
use super::serde_nanos;

/// Request statistics for one scope: the whole run, or one endpoint and
/// method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RqstStats {
    pub total_requests: u64,
    #[serde(with = "serde_nanos")]
    pub total_duration: Duration,
    #[serde(with = "serde_nanos")]
    pub max_duration: Duration,
    #[serde(with = "serde_nanos")]
    pub min_duration: Duration,
    /// Upper end of the regular histogram bins; zero when normalization is
    /// off.
    #[serde(with = "serde_nanos")]
    pub normalized_max_duration: Duration,
    #[serde(with = "serde_nanos")]
    pub avg_duration: Duration,
    /// Individual request durations, ascending once finalized.
    #[serde(with = "serde_nanos::seq")]
    pub timings: Vec<Duration>,
}

impl RqstStats {
    pub(crate) fn record(&mut self, duration: Duration) {
        if self.total_requests == 0 {
            self.min_duration = duration;
            self.max_duration = duration;
        } else {
            self.min_duration = self.min_duration.min(duration);
            self.max_duration = self.max_duration.max(duration);
        }
        self.total_requests = self.total_requests.saturating_add(1);
        self.total_duration = self.total_duration.saturating_add(duration);
        self.timings.push(duration);
    }

    pub(crate) fn finalize(&mut self) {
        self.timings.sort_unstable();
        let average_nanos = self
            .total_duration
            .as_nanos()
            .checked_div(u128::from(self.total_requests))
            .unwrap_or(0);
        self.avg_duration = Duration::from_nanos(u64::try_from(average_nanos).unwrap_or(u64::MAX));
    }

    /// Percentiles over `timings`, which must already be sorted.
    #[must_use]
    pub fn percentiles(&self) -> PercentileSet {
        PercentileSet::from_sorted(&self.timings)
    }
}

/// Per-URL breakdown keyed by HTTP method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDetail {
    pub url: String,
    /// method -> status code -> count
    pub status_distribution: BTreeMap<String, BTreeMap<u16, u64>>,
    /// method -> stats
    pub stats: BTreeMap<String, RqstStats>,
}

impl EndpointDetail {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(with = "serde_nanos")]
    pub run_duration: Duration,
    /// Completed requests per second of run time.
    pub rate_per_sec: f64,
    pub request_stats: RqstStats,
    #[serde(with = "serde_nanos::seq")]
    pub dns_lookup: Vec<Duration>,
    #[serde(with = "serde_nanos::seq")]
    pub tcp_connect: Vec<Duration>,
    #[serde(with = "serde_nanos::seq")]
    pub tls_handshake: Vec<Duration>,
    #[serde(with = "serde_nanos::seq")]
    pub round_trip: Vec<Duration>,
}

/// Final, immutable statistics of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResults {
    pub summary: RunSummary,
    /// url -> method -> request count
    pub endpoint_summary: BTreeMap<String, BTreeMap<String, u64>>,
    pub endpoint_details: BTreeMap<String, EndpointDetail>,
    pub histogram: Histogram,
}
