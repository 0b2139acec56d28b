use tracing::warn;

use crate::domain::{Endpoint, RunBound};

/// Share of the run's targets given to one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointAllocation {
    pub worker_count: usize,
    /// Zero when the run is bounded by duration.
    pub per_worker_requests: u64,
    /// Zero means unthrottled.
    pub per_worker_rate: u64,
}

/// Splits concurrency, request count and rate across an endpoint's workers.
/// Every split rounds up, so totals can exceed the configured targets; each
/// rounding is logged.
pub fn calc_endpoint_allocation(
    endpoint: &Endpoint,
    concurrency: usize,
    rate: u64,
    bound: RunBound,
) -> EndpointAllocation {
    let pct = endpoint.rqst_percent;
    let url = endpoint.url.as_str();

    let concurrency = u64::try_from(concurrency).unwrap_or(u64::MAX);
    let workers = percent_ceil(concurrency, pct);
    if workers.rounded {
        warn!(
            "{}: {}% of {} workers is not a whole number, rounding up to {} workers.",
            url, pct, concurrency, workers.value
        );
    }
    let worker_count = usize::try_from(workers.value).unwrap_or(usize::MAX);
    if workers.value == 0 {
        return EndpointAllocation {
            worker_count: 0,
            per_worker_requests: 0,
            per_worker_rate: 0,
        };
    }

    let per_worker_requests = match bound.request_count() {
        Some(num_requests) if num_requests > 0 => {
            let total = percent_ceil(num_requests, pct);
            if total.rounded {
                warn!(
                    "{}: {}% of {} requests is not a whole number, rounding up to {} requests.",
                    url, pct, num_requests, total.value
                );
            }
            let per_worker = ceil_div(total.value, workers.value);
            if per_worker.rounded {
                warn!(
                    "{}: {} requests do not split evenly across {} workers, each worker sends {}.",
                    url, total.value, workers.value, per_worker.value
                );
            }
            per_worker.value
        }
        _ => 0,
    };

    let per_worker_rate = if rate > 0 {
        let total = percent_ceil(rate, pct);
        if total.rounded {
            warn!(
                "{}: {}% of {} requests/sec is not a whole number, rounding up to {} requests/sec.",
                url, pct, rate, total.value
            );
        }
        let per_worker = ceil_div(total.value, workers.value);
        if per_worker.rounded {
            warn!(
                "{}: {} requests/sec do not split evenly across {} workers, each worker runs at {}/sec.",
                url, total.value, workers.value, per_worker.value
            );
        }
        per_worker.value
    } else {
        0
    };

    EndpointAllocation {
        worker_count,
        per_worker_requests,
        per_worker_rate,
    }
}

#[derive(Debug, Clone, Copy)]
struct Rounded {
    value: u64,
    rounded: bool,
}

fn percent_ceil(total: u64, pct: u64) -> Rounded {
    ceil_div(total.saturating_mul(pct), 100)
}

fn ceil_div(numerator: u64, denominator: u64) -> Rounded {
    if denominator == 0 {
        return Rounded {
            value: 0,
            rounded: false,
        };
    }
    Rounded {
        value: numerator.div_ceil(denominator),
        rounded: numerator.checked_rem(denominator).is_some_and(|rem| rem != 0),
    }
}
