use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::state::GatewayState;

/// Declared `Content-Length`, if present and numeric.
fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Rejects bodies over the configured size with 413.
///
/// The declared length is checked first; the body is then buffered under the
/// same cap so chunked uploads cannot get past.
pub async fn limit_payload(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    let max = state.policy.max_payload_bytes;

    if let Some(length) = declared_length(request.headers()) {
        if length > max {
            tracing::warn!(length, max, "rejecting oversized payload");
            return GatewayError::PayloadTooLarge.into_response();
        }
    }

    let (parts, body) = request.into_parts();
    match axum::body::to_bytes(body, max).await {
        Ok(bytes) => next.run(Request::from_parts(parts, Body::from(bytes))).await,
        Err(e) => {
            tracing::warn!(max, error = %e, "payload exceeded limit while reading");
            GatewayError::PayloadTooLarge.into_response()
        }
    }
}
