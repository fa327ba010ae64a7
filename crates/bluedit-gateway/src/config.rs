use std::fmt;
use std::time::Duration;

use bluedit_core::CookiePolicy;
use bluedit_upstream::CredentialTransport;
use serde::{Deserialize, Serialize};

/// JWT secret used when none is configured. Never acceptable in production.
pub const DEFAULT_JWT_SECRET: &str = "your-super-secret-jwt-key-change-in-production";

/// Deployment environment. Selects the security thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// `production` selects production; anything else is development.
    pub fn from_node_env(value: &str) -> Self {
        if value == "production" {
            Self::Production
        } else {
            Self::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// Errors raised while resolving configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid byte size '{value}': expected a number with an optional b, kb, mb or gb suffix")]
    InvalidByteSize { value: String },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Complete gateway configuration.
///
/// Every section has defaults, so an empty document is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin allowed by CORS, with credentials.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_cors_origin() -> String {
    "http://localhost:3001".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the REST backend.
    #[serde(default = "default_upstream_url")]
    pub url: String,
    #[serde(default = "default_upstream_timeout", with = "duration_str")]
    pub timeout: Duration,
    #[serde(default)]
    pub credential_transport: CredentialTransport,
}

fn default_upstream_url() -> String {
    "http://localhost:3000/api/v1".to_string()
}

fn default_upstream_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout: default_upstream_timeout(),
            credential_transport: CredentialTransport::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret for session JWTs.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default)]
    pub cookie: CookiePolicy,
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            cookie: CookiePolicy::default(),
        }
    }
}

impl AuthConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

/// Optional overrides of the environment-dependent security thresholds.
///
/// Anything left unset falls back to [`SecurityPolicy::defaults`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_query_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_query_complexity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tracked_clients: Option<usize>,
    #[serde(default)]
    pub rate_limit: LimitOverride,
    #[serde(default)]
    pub graphql_limit: GraphqlLimitOverride,
    #[serde(default)]
    pub auth_limit: LimitOverride,
    #[serde(default)]
    pub health_limit: LimitOverride,
    #[serde(default)]
    pub slow_down: SlowDownOverride,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitOverride {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "option_duration_str")]
    pub window: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphqlLimitOverride {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "option_duration_str")]
    pub window: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_queries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mutations: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlowDownOverride {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "option_duration_str")]
    pub window: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_after: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "option_duration_str")]
    pub delay_step: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "option_duration_str")]
    pub max_delay: Option<Duration>,
}

/// A request budget per client: `max` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    pub window: Duration,
    pub max: u32,
}

impl LimitPolicy {
    pub const fn new(window: Duration, max: u32) -> Self {
        Self { window, max }
    }

    /// Window length in whole seconds, rounded up.
    pub fn retry_after_secs(&self) -> u64 {
        let millis = self.window.as_millis();
        millis.div_ceil(1000) as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlowDownPolicy {
    pub window: Duration,
    pub delay_after: u32,
    pub delay_step: Duration,
    pub max_delay: Duration,
}

/// Resolved security thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPolicy {
    pub max_payload_bytes: usize,
    pub max_query_depth: usize,
    pub max_query_complexity: usize,
    pub max_tracked_clients: usize,
    pub default_limit: LimitPolicy,
    pub graphql_queries: LimitPolicy,
    pub graphql_mutations: LimitPolicy,
    pub auth_limit: LimitPolicy,
    pub health_limit: LimitPolicy,
    pub slow_down: SlowDownPolicy,
}

const MINUTE: Duration = Duration::from_secs(60);

impl SecurityPolicy {
    /// Built-in thresholds for `env`.
    pub fn defaults(env: Environment) -> Self {
        let prod = env.is_production();
        let window = if prod { 15 * MINUTE } else { MINUTE };
        Self {
            max_payload_bytes: if prod { 1024 * 1024 } else { 10 * 1024 * 1024 },
            max_query_depth: 10,
            max_query_complexity: 1000,
            max_tracked_clients: 10_000,
            default_limit: LimitPolicy::new(window, if prod { 100 } else { 1000 }),
            graphql_queries: LimitPolicy::new(window, if prod { 100 } else { 1000 }),
            graphql_mutations: LimitPolicy::new(window, if prod { 20 } else { 200 }),
            auth_limit: LimitPolicy::new(window, if prod { 5 } else { 20 }),
            health_limit: if prod {
                LimitPolicy::new(MINUTE, 30)
            } else {
                LimitPolicy::new(Duration::from_secs(10), 100)
            },
            slow_down: SlowDownPolicy {
                window,
                delay_after: if prod { 50 } else { 500 },
                delay_step: Duration::from_millis(if prod { 500 } else { 100 }),
                max_delay: Duration::from_secs(20),
            },
        }
    }

    /// Defaults for `env` with `overrides` applied on top.
    pub fn resolve(env: Environment, overrides: &SecurityConfig) -> Result<Self, ConfigError> {
        let mut policy = Self::defaults(env);

        if let Some(size) = &overrides.max_payload_size {
            policy.max_payload_bytes = parse_byte_size(size)?;
        }
        if let Some(depth) = overrides.max_query_depth {
            policy.max_query_depth = depth;
        }
        if let Some(complexity) = overrides.max_query_complexity {
            policy.max_query_complexity = complexity;
        }
        if let Some(cap) = overrides.max_tracked_clients {
            if cap == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "security.max_tracked_clients".into(),
                    value: cap.to_string(),
                    reason: "must be at least 1".into(),
                });
            }
            policy.max_tracked_clients = cap;
        }

        apply_limit(&mut policy.default_limit, &overrides.rate_limit);
        apply_limit(&mut policy.auth_limit, &overrides.auth_limit);
        apply_limit(&mut policy.health_limit, &overrides.health_limit);

        let graphql = &overrides.graphql_limit;
        if let Some(window) = graphql.window {
            policy.graphql_queries.window = window;
            policy.graphql_mutations.window = window;
        }
        if let Some(max) = graphql.max_queries {
            policy.graphql_queries.max = max;
        }
        if let Some(max) = graphql.max_mutations {
            policy.graphql_mutations.max = max;
        }

        let slow = &overrides.slow_down;
        if let Some(window) = slow.window {
            policy.slow_down.window = window;
        }
        if let Some(after) = slow.delay_after {
            policy.slow_down.delay_after = after;
        }
        if let Some(step) = slow.delay_step {
            policy.slow_down.delay_step = step;
        }
        if let Some(max) = slow.max_delay {
            policy.slow_down.max_delay = max;
        }

        for (key, window) in [
            ("security.rate_limit.window", policy.default_limit.window),
            ("security.graphql_limit.window", policy.graphql_queries.window),
            ("security.auth_limit.window", policy.auth_limit.window),
            ("security.health_limit.window", policy.health_limit.window),
            ("security.slow_down.window", policy.slow_down.window),
        ] {
            if window.is_zero() {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    value: "0s".into(),
                    reason: "window must be longer than zero".into(),
                });
            }
        }

        Ok(policy)
    }
}

fn apply_limit(policy: &mut LimitPolicy, overrides: &LimitOverride) {
    if let Some(window) = overrides.window {
        policy.window = window;
    }
    if let Some(max) = overrides.max {
        policy.max = max;
    }
}

impl GatewayConfig {
    /// Apply the process-environment overrides (`PORT`, `API_URL`,
    /// `CORS_ORIGIN`, `JWT_SECRET`, `NODE_ENV`) read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("NODE_ENV") {
            self.environment = Environment::from_node_env(&env);
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".into(),
                value: port.clone(),
                reason: "expected a port number".into(),
            })?;
        }
        if let Some(url) = lookup("API_URL") {
            self.upstream.url = url;
        }
        if let Some(origin) = lookup("CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            if secret.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "JWT_SECRET".into(),
                    value: String::new(),
                    reason: "must not be empty".into(),
                });
            }
            self.auth.jwt_secret = secret;
        }
        Ok(())
    }

    /// Resolve the security thresholds for the configured environment.
    pub fn security_policy(&self) -> Result<SecurityPolicy, ConfigError> {
        SecurityPolicy::resolve(self.environment, &self.security)
    }
}

/// Parse a size string such as `1mb`, `512kb` or `2048`.
///
/// Suffixes are binary multiples and case-insensitive; a bare number is bytes.
pub fn parse_byte_size(value: &str) -> Result<usize, ConfigError> {
    let invalid = || ConfigError::InvalidByteSize {
        value: value.to_string(),
    };
    let normalized = value.trim().to_ascii_lowercase();
    let split = normalized
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(normalized.len());
    let (digits, unit) = normalized.split_at(split);
    let number: usize = digits.parse().map_err(|_| invalid())?;
    let multiplier: usize = match unit.trim() {
        "" | "b" => 1,
        "kb" => 1024,
        "mb" => 1024 * 1024,
        "gb" => 1024 * 1024 * 1024,
        _ => return Err(invalid()),
    };
    number.checked_mul(multiplier).ok_or_else(invalid)
}

/// Serde adapter for humantime duration strings (`"10s"`, `"15m"`).
mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

mod option_duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
