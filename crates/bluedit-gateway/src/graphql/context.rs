use axum::http::HeaderMap;
use bluedit_core::CookiePolicy;
use bluedit_upstream::{Credential, CredentialTransport};

use crate::identity::{cookie_header, session_token, Identity};

/// Schema-wide settings resolvers need to build upstream credentials.
#[derive(Debug, Clone, Default)]
pub struct ResolverSettings {
    pub cookie: CookiePolicy,
    pub transport: CredentialTransport,
}

/// Request-scoped context inserted into every async-graphql request via `.data()`.
///
/// Resolvers access it with `ctx.data::<RequestContext>()`.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub headers: HeaderMap,
    pub identity: Option<Identity>,
}

impl RequestContext {
    pub fn new(headers: HeaderMap, identity: Option<Identity>) -> Self {
        Self { headers, identity }
    }

    /// The caller's session token, from the bearer header or session cookie.
    pub fn session_token(&self, cookie: &CookiePolicy) -> Option<String> {
        session_token(&self.headers, cookie)
    }

    /// The credential to forward upstream, if the caller has a session.
    ///
    /// With cookie transport the inbound `Cookie` header is forwarded as is
    /// when it carries the session cookie; a bearer-only caller gets a
    /// synthesized session cookie instead.
    pub fn credential(&self, settings: &ResolverSettings) -> Option<Credential> {
        let token = self.session_token(&settings.cookie)?;
        Some(match settings.transport {
            CredentialTransport::Bearer => Credential::Bearer(token),
            CredentialTransport::Cookie => {
                let raw = cookie_header(&self.headers);
                match raw {
                    Some(raw) if settings.cookie.get_token(Some(raw)).is_some() => {
                        Credential::Cookie(raw.to_string())
                    }
                    _ => Credential::Cookie(format!(
                        "{}={}",
                        settings.cookie.name,
                        urlencoding::encode(&token)
                    )),
                }
            }
        })
    }
}
