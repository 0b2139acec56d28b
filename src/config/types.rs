use std::time::Duration;

use serde::Deserialize;

use crate::domain::{ClientCert, Endpoint, HttpMethod, WorkerDistribution};

/// Raw config file contents. Keys accept both snake_case and the PascalCase
/// spelling older heyyall configs use.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(alias = "RqstRate", alias = "rate")]
    pub rqst_rate: Option<u64>,
    #[serde(alias = "MaxConcurrentRqsts", alias = "concurrency")]
    pub max_concurrent_rqsts: Option<usize>,
    #[serde(alias = "RunDuration")]
    pub run_duration: Option<String>,
    #[serde(alias = "NumRequests")]
    pub num_requests: Option<u64>,
    #[serde(alias = "CertFile")]
    pub cert_file: Option<String>,
    #[serde(alias = "KeyFile")]
    pub key_file: Option<String>,
    pub worker_distribution: Option<WorkerDistribution>,
    #[serde(alias = "Endpoints")]
    pub endpoints: Option<Vec<EndpointConfig>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EndpointConfig {
    #[serde(alias = "URL", alias = "Url")]
    pub url: Option<String>,
    #[serde(alias = "Method")]
    pub method: Option<HttpMethod>,
    #[serde(alias = "RqstBody", alias = "body")]
    pub rqst_body: Option<String>,
    #[serde(alias = "RqstPercent")]
    pub rqst_percent: Option<u64>,
    #[serde(alias = "Headers")]
    pub headers: Option<Vec<String>>,
    #[serde(alias = "CertFile")]
    pub cert_file: Option<String>,
    #[serde(alias = "KeyFile")]
    pub key_file: Option<String>,
}

/// Validated run inputs handed to the scheduler and the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTestConfig {
    pub rqst_rate: u64,
    pub concurrency: usize,
    pub run_duration: Duration,
    pub num_requests: u64,
    pub client_cert: Option<ClientCert>,
    pub worker_distribution: WorkerDistribution,
    pub endpoints: Vec<Endpoint>,
}
