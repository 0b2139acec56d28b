use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The single stop condition shared by every worker of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunBound {
    /// Stop after this many requests.
    ByCount(u64),
    /// Stop once this much wall-clock time has elapsed.
    ByDuration(Duration),
}

impl RunBound {
    /// Picks the bound from already validated targets: a non-zero duration
    /// wins, otherwise the request count applies.
    #[must_use]
    pub const fn from_targets(num_requests: u64, run_duration: Duration) -> Self {
        if run_duration.is_zero() {
            RunBound::ByCount(num_requests)
        } else {
            RunBound::ByDuration(run_duration)
        }
    }

    #[must_use]
    pub const fn request_count(self) -> Option<u64> {
        match self {
            RunBound::ByCount(count) => Some(count),
            RunBound::ByDuration(_) => None,
        }
    }
}

/// How concurrency must relate to the number of endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerDistribution {
    /// Every endpoint needs at least one worker; ceiling rounding absorbs
    /// any remainder.
    #[default]
    Ceiling,
    /// Concurrency must be an exact multiple of the endpoint count.
    Even,
}
