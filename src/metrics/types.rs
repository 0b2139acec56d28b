use std::time::Duration;

use crate::domain::HttpMethod;

/// Connection-level sub-timings of one request. A phase the transport did
/// not go through (reused connection, plain HTTP) or cannot observe is
/// `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkTimings {
    pub dns_lookup: Option<Duration>,
    pub tcp_connect: Option<Duration>,
    pub tls_handshake: Option<Duration>,
    pub round_trip: Option<Duration>,
}

/// One completed request, emitted by a worker and consumed once by the
/// stats aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub url: String,
    pub method: HttpMethod,
    pub duration: Duration,
    pub timings: NetworkTimings,
}
