use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::identity::session_token;
use crate::state::GatewayState;

/// Decodes the session token, if any, and attaches the [`Identity`].
///
/// Never rejects: a missing or invalid token leaves the request anonymous and
/// the auth gate or resolvers decide what that means.
///
/// [`Identity`]: crate::identity::Identity
pub async fn authenticate_jwt(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token(request.headers(), &state.config.auth.cookie) {
        match state.jwt.verify(&token) {
            Ok(identity) => {
                tracing::debug!(user_id = %identity.user_id, "authenticated request");
                request.extensions_mut().insert(identity);
            }
            Err(e) => tracing::debug!(error = %e, "ignoring invalid session token"),
        }
    }
    next.run(request).await
}
