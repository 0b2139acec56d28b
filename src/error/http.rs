use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to read cert '{path}': {source}")]
    ReadCert {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read key '{path}': {source}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid cert/key '{path}': {source}")]
    InvalidIdentity {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
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

/// Failure of a single outbound request. Any of these stops the issuing
/// worker.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request timed out: {source}")]
    Timeout {
        #[source]
        source: reqwest::Error,
    },
    #[error("request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("client certificate unusable: {source}")]
    Certificate {
        #[source]
        source: Box<HttpError>,
    },
    #[cfg(test)]
    #[error("{reason}")]
    Unavailable { reason: String },
}

impl RequestError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout { source: err }
        } else {
            RequestError::Transport { source: err }
        }
    }
}
