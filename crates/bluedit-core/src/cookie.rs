//! Session cookie codec.
//!
//! Parses raw `Cookie` request headers and renders the `Set-Cookie` directive
//! that hands a freshly minted session token to the browser.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use http::header::{HeaderMap, HeaderValue, SET_COOKIE};
use serde::{Deserialize, Serialize};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "session_token";

/// Thirty days, in seconds.
pub const SESSION_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// `SameSite` attribute of the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("Strict"),
            Self::Lax => f.write_str("Lax"),
            Self::None => f.write_str("None"),
        }
    }
}

impl FromStr for SameSite {
    type Err = CookieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            _ => Err(CookieError::InvalidSameSite {
                value: s.to_string(),
            }),
        }
    }
}

/// Errors produced while rendering a cookie directive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CookieError {
    /// The `SameSite` value is not one of `Strict`, `Lax`, `None`.
    InvalidSameSite { value: String },
    /// The rendered directive is not a valid HTTP header value.
    InvalidHeaderValue { directive: String },
}

impl fmt::Display for CookieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSameSite { value } => {
                write!(f, "invalid SameSite value '{value}': expected Strict, Lax or None")
            }
            Self::InvalidHeaderValue { directive } => {
                write!(f, "cookie directive '{directive}' is not a valid header value")
            }
        }
    }
}

impl std::error::Error for CookieError {}

/// Attributes of the session cookie.
///
/// The directive is always `HttpOnly`; the remaining attributes are
/// configurable and default to `Path=/; SameSite=Strict; Max-Age=2592000`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiePolicy {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub same_site: SameSite,
    /// Lifetime in seconds.
    #[serde(default = "default_max_age")]
    pub max_age: u64,
}

fn default_cookie_name() -> String {
    SESSION_COOKIE_NAME.to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_max_age() -> u64 {
    SESSION_MAX_AGE_SECS
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            path: default_cookie_path(),
            same_site: SameSite::default(),
            max_age: default_max_age(),
        }
    }
}

impl CookiePolicy {
    /// Look up this policy's cookie in a raw `Cookie` header.
    pub fn get_token(&self, header: Option<&str>) -> Option<String> {
        parse_cookies(header).remove(&self.name)
    }

    /// Render the `Set-Cookie` directive for `token`.
    ///
    /// The token is percent-encoded so the directive is always a valid header
    /// value; [`parse_cookies`] decodes it again on the way back in.
    pub fn directive(&self, token: &str) -> String {
        format!(
            "{}={}; HttpOnly; Path={}; SameSite={}; Max-Age={}",
            self.name,
            urlencoding::encode(token),
            self.path,
            self.same_site,
            self.max_age
        )
    }

    /// Render the directive as a header value.
    pub fn header_value(&self, token: &str) -> Result<HeaderValue, CookieError> {
        let directive = self.directive(token);
        HeaderValue::from_str(&directive)
            .map_err(|_| CookieError::InvalidHeaderValue { directive })
    }

    /// Append the session cookie to outbound response headers.
    pub fn set_token(&self, headers: &mut HeaderMap, token: &str) -> Result<(), CookieError> {
        let value = self.header_value(token)?;
        headers.append(SET_COOKIE, value);
        Ok(())
    }
}

/// Parse a raw `Cookie` header into a name → value mapping.
///
/// Segments are split on `;` and then on the first `=`. Values are
/// URL-decoded (a value that fails to decode is kept verbatim). Segments
/// without a name or without a value are skipped.
pub fn parse_cookies(header: Option<&str>) -> BTreeMap<String, String> {
    let Some(header) = header else {
        return BTreeMap::new();
    };

    header
        .split(';')
        .map(str::trim)
        .filter_map(|segment| {
            let Some((name, value)) = segment.split_once('=') else {
                if !segment.is_empty() {
                    tracing::trace!(segment, "skipping cookie segment without '='");
                }
                return None;
            };
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                tracing::trace!(segment, "skipping cookie segment with empty name or value");
                return None;
            }
            let decoded = urlencoding::decode(value)
                .map(Cow::into_owned)
                .unwrap_or_else(|_| value.to_string());
            Some((name.to_string(), decoded))
        })
        .collect()
}

/// Extract the session token using the default cookie name.
pub fn get_token(header: Option<&str>) -> Option<String> {
    CookiePolicy::default().get_token(header)
}
