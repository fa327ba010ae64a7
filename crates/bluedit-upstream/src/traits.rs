use std::future::Future;

use http::header::HeaderMap;
use http::Method;
use serde_json::Value;

use crate::credential::Credential;
use crate::error::UpstreamError;

/// One call against the backend.
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: Method,
    /// Path relative to the configured base URL, e.g. `/posts/1`.
    pub path: String,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RestRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Attach a credential header if one is given.
    pub fn with_credential(mut self, credential: Option<&Credential>) -> Result<Self, UpstreamError> {
        if let Some(credential) = credential {
            credential.apply(&mut self.headers)?;
        }
        Ok(self)
    }
}

/// Transport-agnostic access to the REST backend.
///
/// Every call resolves to the decoded JSON body, or to an [`UpstreamError`]
/// whose message is ready to show. Implementations never retry.
pub trait RestTransport: Send + Sync {
    fn send(
        &self,
        request: RestRequest,
    ) -> impl Future<Output = Result<Value, UpstreamError>> + Send;

    fn get(
        &self,
        path: &str,
        headers: HeaderMap,
    ) -> impl Future<Output = Result<Value, UpstreamError>> + Send {
        self.send(RestRequest::new(Method::GET, path).with_headers(headers))
    }

    fn post(
        &self,
        path: &str,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> impl Future<Output = Result<Value, UpstreamError>> + Send {
        self.send(with_optional_body(Method::POST, path, body, headers))
    }

    fn put(
        &self,
        path: &str,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> impl Future<Output = Result<Value, UpstreamError>> + Send {
        self.send(with_optional_body(Method::PUT, path, body, headers))
    }

    fn delete(
        &self,
        path: &str,
        headers: HeaderMap,
    ) -> impl Future<Output = Result<Value, UpstreamError>> + Send {
        self.send(RestRequest::new(Method::DELETE, path).with_headers(headers))
    }
}

fn with_optional_body(
    method: Method,
    path: &str,
    body: Option<Value>,
    headers: HeaderMap,
) -> RestRequest {
    let request = RestRequest::new(method, path).with_headers(headers);
    match body {
        Some(body) => request.with_body(body),
        None => request,
    }
}
