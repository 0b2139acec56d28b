use std::path::PathBuf;

use http::header::{HeaderName, HeaderValue};

use crate::args::parse_header;
use crate::domain::{ClientCert, Endpoint};
use crate::error::{ConfigError, ValidationError};

use super::parse::parse_duration_value;
use super::types::{ConfigFile, EndpointConfig, LoadTestConfig};

/// Turns a parsed config file into validated run inputs.
///
/// Scheduling rules (weights, concurrency against request count, ...) are
/// checked later by the scheduler; this only rejects malformed values.
///
/// # Errors
///
/// Returns an error for malformed durations, URLs, headers or certificate
/// pairs.
pub fn resolve_config(config: &ConfigFile) -> Result<LoadTestConfig, ConfigError> {
    let run_duration = match config.run_duration.as_deref() {
        Some(value) if !value.trim().is_empty() => {
            parse_duration_value(value).map_err(|source| ConfigError::InvalidRunDuration {
                value: value.to_owned(),
                source,
            })?
        }
        _ => std::time::Duration::ZERO,
    };

    let client_cert = match (config.cert_file.as_deref(), config.key_file.as_deref()) {
        (Some(cert), Some(key)) => Some(ClientCert {
            cert_file: PathBuf::from(cert),
            key_file: PathBuf::from(key),
        }),
        (Some(_), None) => return Err(ConfigError::CertRequiresKey),
        (None, Some(_)) => return Err(ConfigError::KeyRequiresCert),
        (None, None) => None,
    };

    let mut endpoints = Vec::new();
    for (index, entry) in config.endpoints.iter().flatten().enumerate() {
        let endpoint = resolve_endpoint(entry)
            .map_err(|source| ConfigError::InvalidEndpoint { index, source })?;
        endpoints.push(endpoint);
    }

    Ok(LoadTestConfig {
        rqst_rate: config.rqst_rate.unwrap_or(0),
        concurrency: config.max_concurrent_rqsts.unwrap_or(0),
        run_duration,
        num_requests: config.num_requests.unwrap_or(0),
        client_cert,
        worker_distribution: config.worker_distribution.unwrap_or_default(),
        endpoints,
    })
}

fn resolve_endpoint(entry: &EndpointConfig) -> Result<Endpoint, ValidationError> {
    let url = entry.url.as_deref().unwrap_or_default().trim().to_owned();
    validate_url(&url)?;
    let Some(method) = entry.method else {
        return Err(ValidationError::MissingMethod { url });
    };

    let mut endpoint = Endpoint::new(url.clone(), method, entry.rqst_percent.unwrap_or(0));
    if let Some(body) = entry.rqst_body.as_ref() {
        endpoint = endpoint.with_body(body.clone());
    }

    for raw in entry.headers.iter().flatten() {
        let (key, value) = parse_header(raw)?;
        HeaderName::from_bytes(key.as_bytes()).map_err(|source| {
            ValidationError::InvalidHeaderName {
                header: key.clone(),
                source,
            }
        })?;
        HeaderValue::from_str(&value).map_err(|source| ValidationError::InvalidHeaderValue {
            header: key.clone(),
            source,
        })?;
        endpoint = endpoint.with_header(key, value);
    }

    match (entry.cert_file.as_deref(), entry.key_file.as_deref()) {
        (Some(cert), Some(key)) => {
            endpoint = endpoint.with_client_cert(ClientCert {
                cert_file: PathBuf::from(cert),
                key_file: PathBuf::from(key),
            });
        }
        (Some(_), None) => return Err(ValidationError::CertRequiresKey { url }),
        (None, Some(_)) => return Err(ValidationError::KeyRequiresCert { url }),
        (None, None) => {}
    }

    Ok(endpoint)
}

fn validate_url(url: &str) -> Result<(), ValidationError> {
    let parsed = url::Url::parse(url).map_err(|source| ValidationError::InvalidUrl {
        url: url.to_owned(),
        source,
    })?;
    if parsed.host_str().is_none() {
        return Err(ValidationError::UrlMissingHost {
            url: url.to_owned(),
        });
    }
    Ok(())
}
