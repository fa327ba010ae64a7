use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE};
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;

/// How the session token travels to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialTransport {
    /// Forward a `Cookie` header.
    #[default]
    Cookie,
    /// Send `Authorization: Bearer <token>`.
    Bearer,
}

impl std::fmt::Display for CredentialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cookie => f.write_str("cookie"),
            Self::Bearer => f.write_str("bearer"),
        }
    }
}

/// A per-call credential header.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// A bare session token, sent as a bearer token.
    Bearer(String),
    /// A complete `Cookie` header value.
    Cookie(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Credential::Bearer(..)"),
            Self::Cookie(_) => f.write_str("Credential::Cookie(..)"),
        }
    }
}

impl Credential {
    /// The header this credential is sent as.
    pub fn header(&self) -> Result<(HeaderName, HeaderValue), UpstreamError> {
        let (name, raw) = match self {
            Self::Bearer(token) => (AUTHORIZATION, format!("Bearer {token}")),
            Self::Cookie(cookie) => (COOKIE, cookie.clone()),
        };
        let mut value = HeaderValue::from_str(&raw).map_err(|_| UpstreamError::Transport {
            message: format!("credential is not a valid {name} header value"),
        })?;
        value.set_sensitive(true);
        Ok((name, value))
    }

    /// Insert the credential into outbound headers, replacing any previous value.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), UpstreamError> {
        let (name, value) = self.header()?;
        headers.insert(name, value);
        Ok(())
    }
}
