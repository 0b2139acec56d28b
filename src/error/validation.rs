use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Invalid header name '{header}': {source}")]
    InvalidHeaderName {
        header: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
    #[error("Invalid header value for '{header}': {source}")]
    InvalidHeaderValue {
        header: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("Invalid HTTP method '{value}'. Use GET, POST, PUT, PATCH, DELETE, HEAD, or OPTIONS.")]
    InvalidMethod { value: String },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Endpoint '{url}' has no method.")]
    MissingMethod { url: String },
    #[error("URL '{url}' is missing host.")]
    UrlMissingHost { url: String },
    #[error("Endpoint '{url}' sets a cert file without a key file.")]
    CertRequiresKey { url: String },
    #[error("Endpoint '{url}' sets a key file without a cert file.")]
    KeyRequiresCert { url: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Normalization factor 1 is invalid. Omit it, use 0 to disable, or use a value >= 2.")]
    InvalidNormFactor,
    #[error("--cpus requested {requested} CPUs but only {available} are available.")]
    CpusExceedAvailable { requested: usize, available: usize },
    #[error("Config file location not provided (use --config or ./heyyall.toml / ./heyyall.json).")]
    MissingConfig,
    #[error("At least one endpoint is required.")]
    NoEndpoints,
    #[error("Concurrency must be >= 1.")]
    ConcurrencyZero,
    #[error(
        "Number of requests is {num_requests} and requested duration is {run_duration:?}, one must be zero."
    )]
    CountAndDuration {
        num_requests: u64,
        run_duration: Duration,
    },
    #[error("Number of requests {num_requests} must be at least the concurrency level {concurrency}.")]
    RequestsBelowConcurrency { num_requests: u64, concurrency: usize },
    #[error("There are more endpoints, {endpoints}, than requests, {num_requests}.")]
    MoreEndpointsThanRequests { endpoints: usize, num_requests: u64 },
    #[error(
        "Endpoints must distribute evenly across workers. There are {concurrency} workers and {endpoints} endpoints."
    )]
    UnevenDistribution { concurrency: usize, endpoints: usize },
    #[error(
        "Each endpoint needs at least one worker. There are {concurrency} workers and {endpoints} endpoints."
    )]
    ConcurrencyBelowEndpoints { concurrency: usize, endpoints: usize },
    #[error("Endpoint rqst_percent values must add up to 100, not {total}.")]
    WeightSum { total: u64 },
    #[error("Failed to build runtime: {source}")]
    RuntimeBuildFailed {
        #[source]
        source: std::io::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
