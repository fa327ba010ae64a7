//! Session JWT decoding and the request identity it produces.

use axum::http::header::{HeaderMap, AUTHORIZATION, COOKIE};
use bluedit_core::{CookiePolicy, RecordId};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Decoded session claims attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "userId")]
    pub user_id: RecordId,
    pub email: String,
    #[serde(default)]
    pub iat: i64,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

impl Identity {
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.exp < now_secs
    }
}

/// HS256 verifier for session tokens.
///
/// Expiry is not enforced here: an expired but otherwise valid token still
/// yields an [`Identity`], and the auth gate turns it into a "Token expired"
/// rejection.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Identity>(token, &self.key, &self.validation).map(|data| data.claims)
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier").finish_non_exhaustive()
    }
}

/// The token after a `Bearer ` prefix in the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The raw `Cookie` header, if it is valid text.
pub fn cookie_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(COOKIE)?.to_str().ok()
}

/// Session token from the bearer header, falling back to the session cookie.
pub fn session_token(headers: &HeaderMap, cookie: &CookiePolicy) -> Option<String> {
    bearer_token(headers)
        .map(str::to_string)
        .or_else(|| cookie.get_token(cookie_header(headers)))
}

/// Extractor that optionally extracts the [`Identity`] attached by the JWT stage.
pub struct OptionalIdentity(pub Option<Identity>);

impl<S> axum::extract::FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalIdentity(parts.extensions.get::<Identity>().cloned()))
    }
}
