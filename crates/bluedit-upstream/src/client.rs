use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::error::UpstreamError;
use crate::traits::{RestRequest, RestTransport};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `reqwest`-backed [`RestTransport`].
///
/// Every request carries `Content-Type: application/json` and is bounded by a
/// fixed timeout. Cloning is cheap: the connection pool is shared.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Create a client for `base_url` (e.g. `http://localhost:3000/api/v1`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, request: RestRequest) -> Result<Value, UpstreamError> {
        let RestRequest {
            method,
            path,
            body,
            headers,
        } = request;

        let mut builder = self
            .http
            .request(method.clone(), self.url(&path))
            .header(http::header::CONTENT_TYPE, "application/json")
            .headers(headers);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = UpstreamError::from(e);
                tracing::warn!(%method, %path, error = %err, "upstream request failed");
                return Err(err);
            }
        };

        let status = response.status();
        let bytes = response.bytes().await.map_err(UpstreamError::from)?;
        tracing::debug!(%method, %path, status = status.as_u16(), "upstream call");

        if !status.is_success() {
            let body = serde_json::from_slice::<Value>(&bytes).ok();
            let err = UpstreamError::from_response(status, body.as_ref());
            tracing::warn!(%method, %path, status = status.as_u16(), error = %err, "upstream returned an error");
            return Err(err);
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(%method, %path, error = %e, "upstream returned invalid JSON");
            UpstreamError::Decode {
                message: format!("Invalid JSON from server: {e}"),
            }
        })
    }
}

impl RestTransport for RestClient {
    fn send(
        &self,
        request: RestRequest,
    ) -> impl Future<Output = Result<Value, UpstreamError>> + Send {
        self.execute(request)
    }
}
