use std::fmt;

use async_graphql::ErrorExtensions;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// One rejected field in a request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by the gateway, either as HTTP responses from the
/// middleware chain or as GraphQL errors from resolvers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    /// Body larger than the configured limit. Maps to 413.
    PayloadTooLarge,
    /// A string field matched a dangerous pattern. Maps to 400.
    DangerousContent,
    /// A GraphQL POST whose body is not declared JSON. Maps to 415.
    UnsupportedMediaType,
    /// The body is declared JSON but does not parse. Maps to 400.
    MalformedBody { message: String },
    /// Payload fields have the wrong shape or fail validation. Maps to 400.
    InvalidFields { errors: Vec<FieldError> },
    /// No authenticated identity. Maps to 401.
    Unauthenticated,
    /// Identity present but past its expiry. Maps to 401.
    TokenExpired,
    /// A limiter budget is exhausted. Maps to 429.
    RateLimited {
        error: &'static str,
        message: &'static str,
        retry_after: u64,
    },
    /// An upstream call behind a resolver failed. The message is client-safe.
    ResolverFailed { message: String },
    /// Internal error. Maps to 500.
    Internal { message: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge => f.write_str("Request payload too large"),
            Self::DangerousContent => f.write_str("Request contains potentially dangerous content"),
            Self::UnsupportedMediaType => f.write_str("Content-Type must be application/json"),
            Self::MalformedBody { message } => write!(f, "Malformed request body: {message}"),
            Self::InvalidFields { errors } => {
                let parts: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Invalid request: {}", parts.join("; "))
            }
            Self::Unauthenticated => f.write_str("Authentication required"),
            Self::TokenExpired => f.write_str("Token expired"),
            Self::RateLimited { error, .. } => f.write_str(error),
            Self::ResolverFailed { message } => f.write_str(message),
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for GatewayError {}

impl GatewayError {
    /// Returns the HTTP status code for this error variant.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::DangerousContent | Self::MalformedBody { .. } | Self::InvalidFields { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthenticated | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ResolverFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `extensions.code` used when this error surfaces through GraphQL.
    pub fn graphql_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated | Self::TokenExpired => "UNAUTHENTICATED",
            Self::InvalidFields { .. } | Self::MalformedBody { .. } | Self::DangerousContent => {
                "BAD_USER_INPUT"
            }
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            Self::InvalidFields { errors } => serde_json::json!({ "errors": errors }),
            Self::Unauthenticated => serde_json::json!({
                "error": "Authentication required",
                "message": "Please log in to access this resource",
            }),
            Self::TokenExpired => serde_json::json!({
                "error": "Token expired",
                "message": "Your session has expired, please log in again",
            }),
            Self::RateLimited {
                error,
                message,
                retry_after,
            } => serde_json::json!({
                "error": error,
                "message": message,
                "retryAfter": retry_after,
            }),
            other => serde_json::json!({ "error": other.to_string() }),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, axum::Json(self.body())).into_response();
        if let Self::RateLimited { retry_after, .. } = self {
            response
                .headers_mut()
                .insert(http::header::RETRY_AFTER, HeaderValue::from(retry_after));
        }
        response
    }
}

/// Resolver-side rendering with an `extensions.code`.
///
/// `?` on a `GatewayError` inside a resolver goes through async-graphql's
/// blanket `Display` conversion and drops the code, so resolvers call
/// `.extend()` explicitly.
impl ErrorExtensions for GatewayError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.graphql_code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}
