use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::operation::OperationKind;
use crate::error::GatewayError;
use crate::identity::{Identity, OptionalIdentity};

/// Accepts a present, unexpired identity.
pub fn check_identity(identity: Option<&Identity>, now_secs: i64) -> Result<(), GatewayError> {
    match identity {
        None => Err(GatewayError::Unauthenticated),
        Some(identity) if identity.is_expired_at(now_secs) => Err(GatewayError::TokenExpired),
        Some(_) => Ok(()),
    }
}

/// Rejects anonymous or expired requests with 401.
pub async fn require_auth(
    OptionalIdentity(identity): OptionalIdentity,
    request: Request,
    next: Next,
) -> Response {
    match check_identity(identity.as_ref(), chrono::Utc::now().timestamp()) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::debug!(path = %request.uri().path(), "rejecting unauthenticated request");
            e.into_response()
        }
    }
}

/// [`require_auth`] applied only to protected GraphQL mutations.
pub async fn require_auth_for_mutations(
    identity: OptionalIdentity,
    request: Request,
    next: Next,
) -> Response {
    match request.extensions().get::<OperationKind>() {
        Some(OperationKind::Mutation) => require_auth(identity, request, next).await,
        _ => next.run(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluedit_core::RecordId;

    fn identity(exp: i64) -> Identity {
        Identity {
            user_id: RecordId::from("1"),
            email: "a@example.com".into(),
            iat: 0,
            exp,
        }
    }

    #[test]
    fn missing_identity_is_unauthenticated() {
        assert_eq!(check_identity(None, 100), Err(GatewayError::Unauthenticated));
    }

    #[test]
    fn expired_identity_is_rejected() {
        assert_eq!(
            check_identity(Some(&identity(99)), 100),
            Err(GatewayError::TokenExpired)
        );
    }

    #[test]
    fn expiry_boundary_is_still_valid() {
        assert!(check_identity(Some(&identity(100)), 100).is_ok());
        assert!(check_identity(Some(&identity(200)), 100).is_ok());
    }
}
