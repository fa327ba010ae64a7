use http::StatusCode;
use serde_json::Value;

/// Fallback message when a request never produced a response.
pub const NO_RESPONSE_MESSAGE: &str = "No response from server";

/// The single error kind raised by every upstream call.
///
/// `Display` renders exactly the human-readable message extracted from the
/// failure, so callers can surface it as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum UpstreamError {
    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// The request never reached the backend (connect failure or timeout).
    #[error("No response from server")]
    NoResponse,

    /// The request could not be built or sent.
    #[error("{message}")]
    Transport { message: String },

    /// The backend answered 2xx with a body that is not the expected JSON.
    #[error("{message}")]
    Decode { message: String },
}

impl UpstreamError {
    /// Build the error for a non-2xx response.
    ///
    /// The message is taken, in order, from the body's `error` string, from
    /// its `errors` list joined with `", "`, and finally from the status code.
    pub fn from_response(status: StatusCode, body: Option<&Value>) -> Self {
        let message = body
            .and_then(extract_message)
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
        Self::Status { status, message }
    }

    /// The HTTP status, when the backend answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

fn extract_message(body: &Value) -> Option<String> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Some(error.to_string());
    }
    let errors = body.get("errors")?.as_array()?;
    let parts: Vec<String> = errors
        .iter()
        .map(|e| match e {
            Value::String(s) => s.clone(),
            other => other
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Transport {
                message: err.to_string(),
            }
        } else {
            Self::NoResponse
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_field_wins() {
        let body = json!({"error": "bad", "errors": ["x", "y"]});
        let err = UpstreamError::from_response(StatusCode::UNPROCESSABLE_ENTITY, Some(&body));
        assert_eq!(err.to_string(), "bad");
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
    }

    #[test]
    fn errors_list_is_joined() {
        let body = json!({"errors": ["Name is too short", "Name has already been taken"]});
        let err = UpstreamError::from_response(StatusCode::UNPROCESSABLE_ENTITY, Some(&body));
        assert_eq!(
            err.to_string(),
            "Name is too short, Name has already been taken"
        );
    }

    #[test]
    fn errors_list_of_objects_uses_messages() {
        let body = json!({"errors": [{"message": "one"}, {"message": "two"}]});
        let err = UpstreamError::from_response(StatusCode::BAD_REQUEST, Some(&body));
        assert_eq!(err.to_string(), "one, two");
    }

    #[test]
    fn empty_errors_list_falls_back_to_status() {
        let body = json!({"errors": []});
        let err = UpstreamError::from_response(StatusCode::BAD_REQUEST, Some(&body));
        assert_eq!(err.to_string(), "Request failed with status code 400");
    }

    #[test]
    fn missing_body_falls_back_to_status() {
        let err = UpstreamError::from_response(StatusCode::NOT_FOUND, None);
        assert_eq!(err.to_string(), "Request failed with status code 404");
        assert!(err.is_not_found());
    }

    #[test]
    fn not_found_is_status_based() {
        let body = json!({"error": "Subbluedit missing"});
        let err = UpstreamError::from_response(StatusCode::NOT_FOUND, Some(&body));
        assert!(err.is_not_found());
        let err = UpstreamError::from_response(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert!(!err.is_not_found());
    }

    #[test]
    fn no_response_message() {
        assert_eq!(UpstreamError::NoResponse.to_string(), NO_RESPONSE_MESSAGE);
        assert!(UpstreamError::NoResponse.status().is_none());
        assert!(!UpstreamError::NoResponse.is_not_found());
    }

    #[test]
    fn non_string_error_field_is_ignored() {
        let body = json!({"error": {"code": 7}});
        let err = UpstreamError::from_response(StatusCode::BAD_GATEWAY, Some(&body));
        assert_eq!(err.to_string(), "Request failed with status code 502");
    }
}
