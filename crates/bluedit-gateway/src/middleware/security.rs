use axum::extract::{Request, State};
use axum::http::header::{CONTENT_SECURITY_POLICY, USER_AGENT, X_XSS_PROTECTION};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;

use super::throttle::client_key;
use crate::config::Environment;
use crate::error::GatewayError;
use crate::state::GatewayState;

const STATIC_HEADERS: &[(&str, &str)] = &[
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains; preload",
    ),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-site"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-xss-protection", "0"),
];

/// Response headers stamped on every response.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    csp: HeaderValue,
    development: bool,
}

impl SecurityHeaders {
    /// Build the header set; `api_url` is allowed as a `connect-src`.
    pub fn new(api_url: &str, environment: Environment) -> Result<Self, GatewayError> {
        let csp = content_security_policy(api_url);
        let csp = HeaderValue::from_str(&csp).map_err(|_| GatewayError::Internal {
            message: format!("API URL '{api_url}' cannot appear in a Content-Security-Policy"),
        })?;
        Ok(Self {
            csp,
            development: !environment.is_production(),
        })
    }

    /// Write the headers for a response to `method` `path`.
    pub fn apply(&self, headers: &mut HeaderMap, method: &Method, path: &str) {
        headers.insert(CONTENT_SECURITY_POLICY, self.csp.clone());
        for &(name, value) in STATIC_HEADERS {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        headers.remove("x-powered-by");

        if method == Method::POST && path == "/" {
            headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
            if self.development {
                headers.insert(
                    HeaderName::from_static("x-graphql-introspection"),
                    HeaderValue::from_static("enabled"),
                );
            }
        }
    }
}

fn content_security_policy(api_url: &str) -> String {
    [
        "default-src 'self'".to_string(),
        "style-src 'self' 'unsafe-inline'".to_string(),
        "script-src 'self'".to_string(),
        "img-src 'self' data: https:".to_string(),
        format!("connect-src 'self' {api_url}"),
        "font-src 'self'".to_string(),
        "object-src 'none'".to_string(),
        "media-src 'self'".to_string(),
        "frame-src 'none'".to_string(),
    ]
    .join("; ")
}

pub async fn security_headers(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;
    state.headers.apply(response.headers_mut(), &method, &path);
    response
}

/// Logs requests that look like injection attempts. Never blocks.
pub async fn security_logging(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    let url = request.uri().to_string();
    let method = request.method().as_str();
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let filter = &state.filter;
    if filter.is_suspicious(user_agent) || filter.is_suspicious(&url) || filter.is_suspicious(method)
    {
        tracing::warn!(
            ip = %client_key(request.extensions()),
            user_agent,
            url = %url,
            method,
            "suspicious request detected"
        );
    }

    next.run(request).await
}
