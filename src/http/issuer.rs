use async_trait::async_trait;

use crate::domain::{ClientCert, Endpoint, HttpMethod};
use crate::error::RequestError;
use crate::metrics::NetworkTimings;

/// Everything needed to issue one request against an endpoint.
#[derive(Debug, Clone, Copy)]
pub struct OutboundRequest<'a> {
    pub method: HttpMethod,
    pub url: &'a str,
    pub body: &'a str,
    pub headers: &'a [(String, String)],
    /// Endpoint-level override; `None` means the client's global identity.
    pub client_cert: Option<&'a ClientCert>,
}

impl<'a> OutboundRequest<'a> {
    #[must_use]
    pub fn for_endpoint(endpoint: &'a Endpoint) -> Self {
        Self {
            method: endpoint.method,
            url: &endpoint.url,
            body: &endpoint.body,
            headers: &endpoint.headers,
            client_cert: endpoint.client_cert.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedResponse {
    pub status: u16,
    pub timings: NetworkTimings,
}

/// The raw HTTP call workers make. Any status code is a successful issue;
/// only transport-level failures are errors.
#[async_trait]
pub trait HttpIssuer: Send + Sync {
    async fn issue(&self, request: &OutboundRequest<'_>) -> Result<IssuedResponse, RequestError>;
}
