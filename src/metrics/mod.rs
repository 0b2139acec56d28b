//! Response aggregation, percentiles and latency histograms.
mod collector;
mod histogram;
mod percentiles;
pub(crate) mod serde_nanos;
mod stats;
mod types;


pub use collector::{StatsAggregator, spawn_stats_aggregator};
pub use histogram::{Histogram, HistogramBin, build_histogram};
pub use percentiles::{PercentileSet, median, percentile};
pub use stats::{EndpointDetail, RqstStats, RunResults, RunSummary};
pub use types::{NetworkTimings, Response};
