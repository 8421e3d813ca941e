// logtrail - platform/http.rs
//
// Blocking HTTP implementation of `ActionSource`: one POST per page with the
// JSON page request as body, JSON page as response.
//
// Transport failures (connect, timeout, non-2xx, unreadable body) and decode
// failures (invalid JSON, missing `actions`, malformed entries) are reported
// as distinct error kinds. Neither is retried.

use crate::app::tail::ActionSource;
use crate::core::model::{Page, PageRequest};
use crate::util::constants::{APP_NAME, APP_VERSION};
use crate::util::error::{ConfigError, DecodeError, Result, TransportError};
use reqwest::blocking::Client;
use reqwest::Url;
use std::time::Duration;

/// Action log served by a node's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    endpoint: String,
}

impl HttpSource {
    /// Build a source for `endpoint` with a per-request `timeout`.
    ///
    /// The endpoint is parsed up front so a typo fails before the first
    /// request rather than as a transport error.
    pub fn new(endpoint: &str, timeout: Duration) -> std::result::Result<Self, ConfigError> {
        let url = Url::parse(endpoint).map_err(|e| ConfigError::ValueOutOfRange {
            field: "endpoint".to_string(),
            value: endpoint.to_string(),
            expected: format!("an absolute http(s) URL ({e})"),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValueOutOfRange {
                field: "endpoint".to_string(),
                value: endpoint.to_string(),
                expected: "an http or https URL".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{APP_NAME}/{APP_VERSION}"))
            .build()
            .map_err(|e| ConfigError::Client { source: e })?;

        tracing::debug!(endpoint, timeout_secs = timeout.as_secs(), "HTTP source ready");

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl ActionSource for HttpSource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn fetch_page(&mut self, request: &PageRequest) -> Result<Page> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| TransportError::Request {
                endpoint: self.endpoint.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                endpoint = %self.endpoint,
                status = status.as_u16(),
                "Node rejected page request"
            );
            return Err(TransportError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.text().map_err(|e| TransportError::Body {
            endpoint: self.endpoint.clone(),
            source: e,
        })?;

        let page: Page = serde_json::from_str(&body).map_err(|e| DecodeError::Json {
            endpoint: self.endpoint.clone(),
            source: e,
        })?;

        tracing::trace!(bytes = body.len(), entries = page.actions.len(), "Page decoded");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unparseable_endpoint() {
        let err = HttpSource::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConfigError::ValueOutOfRange { .. }), "{err}");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = HttpSource::new("ftp://127.0.0.1/api", Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("ftp://127.0.0.1/api"), "{err}");
    }

    #[test]
    fn test_accepts_default_endpoint() {
        let source = HttpSource::new(
            crate::util::constants::DEFAULT_ENDPOINT,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(source.endpoint(), "http://127.0.0.1:14111/api");
    }
}
