use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;

use crate::args::DEFAULT_USER_AGENT;
use crate::domain::{ClientCert, HttpMethod};
use crate::error::{HttpError, RequestError};
use crate::metrics::NetworkTimings;

use super::issuer::{HttpIssuer, IssuedResponse, OutboundRequest};
use super::resolver::{TimedResolver, with_dns_timing};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub timeout: Duration,
    /// Idle connections kept per host; heyyall sizes this to the run's
    /// concurrency.
    pub pool_max_idle_per_host: usize,
    pub client_cert: Option<ClientCert>,
}

impl ClientSettings {
    #[must_use]
    pub const fn new(timeout: Duration, pool_max_idle_per_host: usize) -> Self {
        Self {
            timeout,
            pool_max_idle_per_host,
            client_cert: None,
        }
    }

    #[must_use]
    pub fn with_client_cert(mut self, cert: Option<ClientCert>) -> Self {
        self.client_cert = cert;
        self
    }
}

/// `HttpIssuer` backed by reqwest. Endpoints overriding the client
/// certificate get their own client, built the first time it is needed.
pub struct ReqwestIssuer {
    settings: ClientSettings,
    base: Client,
    per_cert: RwLock<HashMap<ClientCert, Client>>,
}

impl ReqwestIssuer {
    /// Builds the shared client, loading the global identity if one is set.
    ///
    /// # Errors
    ///
    /// Returns an error when the certificate pair cannot be read or parsed,
    /// or when the client cannot be built.
    pub fn new(settings: ClientSettings) -> Result<Self, HttpError> {
        let base = build_client(&settings, settings.client_cert.as_ref())?;
        Ok(Self {
            settings,
            base,
            per_cert: RwLock::new(HashMap::new()),
        })
    }

    async fn client_for(&self, cert: Option<&ClientCert>) -> Result<Client, HttpError> {
        let Some(cert) = cert else {
            return Ok(self.base.clone());
        };
        if self.settings.client_cert.as_ref() == Some(cert) {
            return Ok(self.base.clone());
        }
        if let Some(client) = self.per_cert.read().await.get(cert) {
            return Ok(client.clone());
        }

        let mut clients = self.per_cert.write().await;
        if let Some(client) = clients.get(cert) {
            return Ok(client.clone());
        }
        debug!(
            "Building client for certificate {}",
            cert.cert_file.display()
        );
        let client = build_client(&self.settings, Some(cert))?;
        clients.insert(cert.clone(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl HttpIssuer for ReqwestIssuer {
    async fn issue(&self, request: &OutboundRequest<'_>) -> Result<IssuedResponse, RequestError> {
        let client = self
            .client_for(request.client_cert)
            .await
            .map_err(|err| RequestError::Certificate {
                source: Box::new(err),
            })?;

        let mut builder = client.request(to_reqwest_method(request.method), request.url);
        for (key, value) in request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.to_owned());
        }

        let (outcome, dns_lookup) = with_dns_timing(async move {
            let sent = Instant::now();
            let response = builder.send().await.map_err(RequestError::from_reqwest)?;
            let round_trip = sent.elapsed();
            let status = response.status().as_u16();

            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                chunk.map_err(RequestError::from_reqwest)?;
            }
            Ok::<_, RequestError>((status, round_trip))
        })
        .await;
        let (status, round_trip) = outcome?;

        Ok(IssuedResponse {
            status,
            timings: NetworkTimings {
                dns_lookup,
                tcp_connect: None,
                tls_handshake: None,
                round_trip: Some(round_trip),
            },
        })
    }
}

fn build_client(settings: &ClientSettings, cert: Option<&ClientCert>) -> Result<Client, HttpError> {
    let mut builder = Client::builder()
        .timeout(settings.timeout)
        .pool_max_idle_per_host(settings.pool_max_idle_per_host)
        .user_agent(DEFAULT_USER_AGENT)
        .dns_resolver(Arc::new(TimedResolver));

    if let Some(cert) = cert {
        builder = builder.identity(load_identity(cert)?);
    }

    builder
        .build()
        .map_err(|err| HttpError::BuildClientFailed { source: err })
}

fn load_identity(cert: &ClientCert) -> Result<reqwest::Identity, HttpError> {
    let cert_bytes = std::fs::read(&cert.cert_file).map_err(|err| HttpError::ReadCert {
        path: cert.cert_file.clone(),
        source: err,
    })?;
    let key_bytes = std::fs::read(&cert.key_file).map_err(|err| HttpError::ReadKey {
        path: cert.key_file.clone(),
        source: err,
    })?;
    reqwest::Identity::from_pkcs8_pem(&cert_bytes, &key_bytes).map_err(|err| {
        HttpError::InvalidIdentity {
            path: cert.cert_file.clone(),
            source: err,
        }
    })
}

pub(crate) fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}
