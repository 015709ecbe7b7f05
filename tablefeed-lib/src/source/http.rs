//! HTTP-backed data source.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::DataSource;
use super::DeleteResponse;
use crate::error::SourceError;
use crate::model::Row;

/// A [`DataSource`] speaking the backend's REST dialect over HTTP.
///
/// Endpoints are resolved relative to a base URL:
///
/// - `GET {base}/{endpoint}{query}` — one page of rows as a JSON array,
/// - `GET {base}/{endpoint}/count?where={expr}` — bare integer body,
/// - `DELETE {base}/{endpoint}/{id}` — [`DeleteResponse`] JSON body.
///
/// Query strings are passed through verbatim; the backend expects the raw
/// clause grammar, not percent-encoded text.
///
/// # Example
///
/// ```
/// use tablefeed_lib::source::HttpSource;
///
/// let source = HttpSource::new("https://api.example.com/v1")?;
/// # Ok::<(), tablefeed_lib::SourceError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: Url,
    http: Client,
    timeout: Option<Duration>,
}

impl HttpSource {
    /// Creates a source for the given base URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, SourceError> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| SourceError::InvalidUrl(format!("{}: {}", base_url.as_ref(), e)))?;

        Ok(Self {
            base_url,
            http: Client::new(),
            timeout: None,
        })
    }

    /// Replaces the underlying HTTP client (custom TLS, proxies, headers).
    pub fn with_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Sets a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, SourceError> {
        debug!("GET {}", url);
        let mut request = self.http.get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        Self::check_status(response).await
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(SourceError::http(status, body))
        }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn count(&self, endpoint: &str, where_expression: &str) -> Result<u64, SourceError> {
        let mut url = self.endpoint_url(&format!("{}/count", endpoint));
        if !where_expression.is_empty() {
            url.push_str(&format!("?where={}", where_expression));
        }

        let body = self.get(&url).await?.text().await?;
        body.trim().parse().map_err(|_| {
            SourceError::parse_with_body(format!("invalid count response: {}", body.trim()), body)
        })
    }

    async fn list(&self, endpoint: &str, query: &str) -> Result<Vec<Row>, SourceError> {
        let url = self.endpoint_url(&format!("{}{}", endpoint, query));
        let response = self.get(&url).await?;
        response
            .json()
            .await
            .map_err(|e| SourceError::parse(format!("invalid row page: {}", e)))
    }

    async fn delete(&self, endpoint: &str, id: &Value) -> Result<DeleteResponse, SourceError> {
        let url = self.endpoint_url(&format!("{}/{}", endpoint, id_segment(id)));
        debug!("DELETE {}", url);

        let mut request = self.http.delete(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = Self::check_status(request.send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| SourceError::parse(format!("invalid delete response: {}", e)))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::network(e.to_string())
    }
}

/// Renders an id value as a URL path segment. String ids go in bare, without
/// JSON quoting.
fn id_segment(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
