use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::args::NormFactor;

use super::histogram::{build_histogram_sorted, normalized_max};
use super::stats::{EndpointDetail, RqstStats, RunResults, RunSummary};
use super::types::Response;

/// Sole consumer of worker responses for one run.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    norm_factor: NormFactor,
    global: RqstStats,
    endpoint_summary: BTreeMap<String, BTreeMap<String, u64>>,
    endpoint_details: BTreeMap<String, EndpointDetail>,
    dns_lookup: Vec<Duration>,
    tcp_connect: Vec<Duration>,
    tls_handshake: Vec<Duration>,
    round_trip: Vec<Duration>,
}

impl StatsAggregator {
    #[must_use]
    pub fn new(norm_factor: NormFactor) -> Self {
        Self {
            norm_factor,
            global: RqstStats::default(),
            endpoint_summary: BTreeMap::new(),
            endpoint_details: BTreeMap::new(),
            dns_lookup: Vec::new(),
            tcp_connect: Vec::new(),
            tls_handshake: Vec::new(),
            round_trip: Vec::new(),
        }
    }

    pub fn accumulate(&mut self, response: &Response) {
        let method = response.method.as_str();
        self.global.record(response.duration);

        let detail = self
            .endpoint_details
            .entry(response.url.clone())
            .or_insert_with(|| EndpointDetail::new(&response.url));
        detail
            .stats
            .entry(method.to_owned())
            .or_default()
            .record(response.duration);
        let status_count = detail
            .status_distribution
            .entry(method.to_owned())
            .or_default()
            .entry(response.status)
            .or_insert(0);
        *status_count = status_count.saturating_add(1);

        let summary_count = self
            .endpoint_summary
            .entry(response.url.clone())
            .or_default()
            .entry(method.to_owned())
            .or_insert(0);
        *summary_count = summary_count.saturating_add(1);

        let timings = &response.timings;
        self.dns_lookup.extend(timings.dns_lookup);
        self.tcp_connect.extend(timings.tcp_connect);
        self.tls_handshake.extend(timings.tls_handshake);
        self.round_trip.extend(timings.round_trip);
    }

    /// Finalizes with the run measured from `started` until now.
    #[must_use]
    pub fn finalize(self, started: Instant) -> RunResults {
        self.finalize_with_duration(started.elapsed())
    }

    #[must_use]
    pub fn finalize_with_duration(mut self, run_duration: Duration) -> RunResults {
        self.global.finalize();
        for detail in self.endpoint_details.values_mut() {
            for stats in detail.stats.values_mut() {
                stats.finalize();
            }
        }
        if self.norm_factor.is_enabled() {
            self.global.normalized_max_duration =
                normalized_max(self.global.min_duration, self.norm_factor);
        }
        let histogram = build_histogram_sorted(&self.global.timings, self.norm_factor);

        let seconds = run_duration.as_secs_f64();
        let rate_per_sec = if seconds > 0.0 {
            self.global.total_requests as f64 / seconds
        } else {
            0.0
        };

        for list in [
            &mut self.dns_lookup,
            &mut self.tcp_connect,
            &mut self.tls_handshake,
            &mut self.round_trip,
        ] {
            list.sort_unstable();
        }

        RunResults {
            summary: RunSummary {
                run_duration,
                rate_per_sec,
                request_stats: self.global,
                dns_lookup: self.dns_lookup,
                tcp_connect: self.tcp_connect,
                tls_handshake: self.tls_handshake,
                round_trip: self.round_trip,
            },
            endpoint_summary: self.endpoint_summary,
            endpoint_details: self.endpoint_details,
            histogram,
        }
    }

    /// Drains `responses` until every sender is gone, then finalizes.
    pub async fn run(mut self, mut responses: mpsc::Receiver<Response>, started: Instant) -> RunResults {
        while let Some(response) = responses.recv().await {
            self.accumulate(&response);
        }
        debug!(
            "Response channel closed after {} responses.",
            self.global.total_requests
        );
        self.finalize(started)
    }
}

#[must_use]
pub fn spawn_stats_aggregator(
    responses: mpsc::Receiver<Response>,
    norm_factor: NormFactor,
    started: Instant,
) -> JoinHandle<RunResults> {
    tokio::spawn(StatsAggregator::new(norm_factor).run(responses, started))
}
