//! Blocking JSON-over-HTTP plumbing shared by the service clients.

use crate::error::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a client with a per-request timeout and default headers.
///
/// `auth` is an optional `(header, value)` pair, e.g. `("authorization", "Bearer ...")`.
pub(crate) fn build_client(
    service: &'static str,
    timeout: Duration,
    auth: Option<(&'static str, String)>,
) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some((name, value)) = auth {
        let value = HeaderValue::from_str(value.trim())
            .map_err(|_| Error::Config(format!("invalid {} API key", service)))?;
        headers.insert(HeaderName::from_static(name), value);
    }
    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|source| Error::Http { service, source })
}

/// Reject empty credentials up front.
pub(crate) fn require(service: &'static str, what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("missing {} {}", service, what)));
    }
    Ok(())
}

/// Send a request and decode a JSON response.
///
/// Non-success statuses become [`Error::ServiceStatus`] carrying the body.
pub(crate) fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
) -> Result<T> {
    let response = request
        .send()
        .map_err(|source| Error::Http { service, source })?;
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        return Err(Error::ServiceStatus {
            service,
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .map_err(|e| Error::malformed(service, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_blank() {
        assert!(require("summarizer", "API key", "  ").is_err());
        assert!(require("summarizer", "API key", "k").is_ok());
    }

    #[test]
    fn test_build_client_rejects_bad_header_value() {
        let err = build_client(
            "embedder",
            Duration::from_secs(1),
            Some(("authorization", "Bearer bad\nkey".to_string())),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
