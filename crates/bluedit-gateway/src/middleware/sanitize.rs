//! JSON body sanitization.
//!
//! Top-level string fields of a JSON object body are screened for script
//! injection. A match rejects the request; otherwise the field is stripped of
//! angle brackets, `javascript:` and inline event handlers, then trimmed.
//!
//! The GraphQL executor parses any `POST /` body as JSON, so that endpoint
//! only accepts bodies declared as JSON; anything else is rejected with 415
//! before it can skip the screening.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use regex::{Regex, RegexSet};
use serde_json::Value;

use crate::error::GatewayError;
use crate::state::GatewayState;

/// The parsed JSON body, attached for later stages.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

/// Compiled content patterns.
#[derive(Debug)]
pub struct ContentFilter {
    dangerous: RegexSet,
    suspicious: RegexSet,
    brackets: Regex,
    javascript: Regex,
    handlers: Regex,
}

impl ContentFilter {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            dangerous: RegexSet::new([
                r"(?is)<script\b.*?</script>",
                r"(?i)javascript:",
                r"(?i)on\w+\s*=",
                r"(?is)<iframe\b.*?</iframe>",
            ])?,
            suspicious: RegexSet::new([
                r"(?i)<script",
                r"(?i)javascript:",
                r"(?i)on\w+\s*=",
                r"(?i)union\s+select",
                r"(?i)drop\s+table",
                r"(?i)exec\s*\(",
            ])?,
            brackets: Regex::new(r"[<>]")?,
            javascript: Regex::new(r"(?i)javascript:")?,
            handlers: Regex::new(r"(?i)on\w+=")?,
        })
    }

    /// True if `input` contains script tags, `javascript:` URIs, inline event
    /// handlers or iframes.
    pub fn is_dangerous(&self, input: &str) -> bool {
        self.dangerous.is_match(input)
    }

    /// True if `input` looks like an injection attempt. Used for logging only.
    pub fn is_suspicious(&self, input: &str) -> bool {
        self.suspicious.is_match(input)
    }

    pub fn sanitize(&self, input: &str) -> String {
        let s = self.brackets.replace_all(input, "");
        let s = self.javascript.replace_all(&s, "");
        let s = self.handlers.replace_all(&s, "");
        s.trim().to_string()
    }

    /// Screen and clean every top-level string field of an object.
    ///
    /// Non-object values are returned unchanged.
    pub fn sanitize_value(&self, value: Value) -> Result<Value, GatewayError> {
        let Value::Object(map) = value else {
            return Ok(value);
        };
        let mut cleaned = serde_json::Map::with_capacity(map.len());
        for (key, field) in map {
            let field = match field {
                Value::String(s) => {
                    if self.is_dangerous(&s) {
                        tracing::warn!(field = %key, "rejecting body with dangerous content");
                        return Err(GatewayError::DangerousContent);
                    }
                    Value::String(self.sanitize(&s))
                }
                other => other,
            };
            cleaned.insert(key, field);
        }
        Ok(Value::Object(cleaned))
    }
}

/// True for `application/json` and `application/*+json` content types.
pub fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

pub async fn sanitize_body(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    if !is_json(request.headers()) {
        if request.method() == Method::POST && request.uri().path() == "/" {
            tracing::debug!(
                content_type = ?request.headers().get(CONTENT_TYPE),
                "rejecting non-JSON GraphQL request"
            );
            return GatewayError::UnsupportedMediaType.into_response();
        }
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return GatewayError::MalformedBody {
                message: e.to_string(),
            }
            .into_response()
        }
    };
    if bytes.is_empty() {
        return next.run(Request::from_parts(parts, Body::empty())).await;
    }

    let value: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "rejecting malformed JSON body");
            return GatewayError::MalformedBody {
                message: e.to_string(),
            }
            .into_response();
        }
    };

    let value = match state.filter.sanitize_value(value) {
        Ok(value) => value,
        Err(e) => return e.into_response(),
    };

    let encoded = match serde_json::to_vec(&value) {
        Ok(encoded) => encoded,
        Err(e) => {
            return GatewayError::Internal {
                message: e.to_string(),
            }
            .into_response()
        }
    };
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    parts.extensions.insert(JsonBody(value));
    next.run(Request::from_parts(parts, Body::from(encoded))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;
    use serde_json::json;

    fn filter() -> ContentFilter {
        ContentFilter::new().unwrap()
    }

    #[test]
    fn detects_dangerous_patterns() {
        let f = filter();
        assert!(f.is_dangerous("<script>alert(1)</script>"));
        assert!(f.is_dangerous("<SCRIPT src=x>\n</script>"));
        assert!(f.is_dangerous("javascript:alert(1)"));
        assert!(f.is_dangerous("<img onerror=alert(1)>"));
        assert!(f.is_dangerous("x onclick = y"));
        assert!(f.is_dangerous("<iframe src=evil></iframe>"));
    }

    #[test]
    fn ordinary_text_is_not_dangerous() {
        let f = filter();
        assert!(!f.is_dangerous("Hello world"));
        assert!(!f.is_dangerous("{ postById(id: \"1\") { title } }"));
        assert!(!f.is_dangerous("a <script> without closing tag"));
        // "on" must be followed by a word character before the `=`.
        assert!(!f.is_dangerous("the person=me"));
    }

    #[test]
    fn handler_pattern_matches_inside_words() {
        let f = filter();
        assert!(f.is_dangerous("condition=1"));
        assert!(f.is_dangerous("a=1&onload =x"));
        assert_eq!(f.sanitize("condition=1"), "c1");
    }

    #[test]
    fn sanitize_strips_and_trims() {
        let f = filter();
        assert_eq!(f.sanitize("  <b>bold</b>  "), "bbold/b");
        assert_eq!(f.sanitize("go JavaScript:now"), "go now");
        assert_eq!(f.sanitize("x onload=1"), "x 1");
    }

    #[test]
    fn sanitize_value_cleans_top_level_strings() {
        let f = filter();
        let value = json!({"query": "  { me { id } }  ", "count": 3, "nested": {"a": "<x>"}});
        let cleaned = f.sanitize_value(value).unwrap();
        assert_eq!(cleaned["query"], "{ me { id } }");
        assert_eq!(cleaned["count"], 3);
        // Nested values are left alone.
        assert_eq!(cleaned["nested"]["a"], "<x>");
    }

    #[test]
    fn sanitize_value_rejects_dangerous_field() {
        let f = filter();
        let err = f
            .sanitize_value(json!({"title": "<script>x</script>"}))
            .unwrap_err();
        assert_eq!(err, GatewayError::DangerousContent);
    }

    #[test]
    fn non_object_values_pass_through() {
        let f = filter();
        let value = json!(["<script>x</script>"]);
        assert_eq!(f.sanitize_value(value.clone()).unwrap(), value);
    }

    #[test]
    fn suspicious_patterns() {
        let f = filter();
        assert!(f.is_suspicious("/?q=1 UNION SELECT password"));
        assert!(f.is_suspicious("DROP   TABLE users"));
        assert!(f.is_suspicious("exec (cmd)"));
        assert!(f.is_suspicious("<script"));
        assert!(!f.is_suspicious("/health"));
        assert!(!f.is_suspicious("Mozilla/5.0 (X11; Linux x86_64)"));
    }

    #[test]
    fn json_content_types() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(is_json(&headers));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("Application/JSON; charset=utf-8"),
        );
        assert!(is_json(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/graphql+json"));
        assert!(is_json(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
    }

    proptest! {
        /// Sanitized output never contains angle brackets and is trimmed.
        #[test]
        fn sanitized_output_is_clean(input in ".*") {
            let out = filter().sanitize(&input);
            prop_assert!(!out.contains('<'));
            prop_assert!(!out.contains('>'));
            prop_assert_eq!(out.trim(), out.as_str());
        }

        /// Plain alphanumeric text is never flagged.
        #[test]
        fn alphanumerics_are_safe(input in "[a-zA-Z0-9 ]{0,64}") {
            prop_assert!(!filter().is_dangerous(&input));
        }
    }
}
