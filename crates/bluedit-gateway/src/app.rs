use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use bluedit_upstream::{RestClient, RestTransport};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::graphql::build_schema;
use crate::identity::JwtVerifier;
use crate::middleware::rate_limit::Limiters;
use crate::middleware::sanitize::ContentFilter;
use crate::middleware::security::SecurityHeaders;
use crate::routes::gateway_router;
use crate::state::{DynRestTransport, GatewayState};
use crate::upstream::UpstreamApi;

/// A fully assembled gateway, ready to be served or mounted.
///
/// Usage:
/// ```rust,ignore
/// let gateway = Gateway::builder().with_config(config).build()?;
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:4000").await?;
/// gateway.serve_on(listener).await?;
/// ```
pub struct Gateway {
    state: GatewayState,
}

/// Builder for [`Gateway`].
#[derive(Default)]
pub struct GatewayBuilder {
    config: GatewayConfig,
    transport: Option<Arc<dyn DynRestTransport>>,
}

impl GatewayBuilder {
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `transport` for upstream calls instead of an HTTP client built
    /// from `upstream.url`.
    pub fn with_transport<T: RestTransport + 'static>(mut self, transport: T) -> Self {
        let transport: Arc<dyn DynRestTransport> = Arc::new(transport);
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Gateway, GatewayError> {
        let config = self.config;
        let policy = config
            .security_policy()
            .map_err(|e| GatewayError::Internal {
                message: format!("invalid security configuration: {e}"),
            })?;

        if config.environment.is_production() && config.auth.uses_default_secret() {
            tracing::warn!("JWT_SECRET is not set; using the built-in default secret in production");
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let client = RestClient::new(config.upstream.url.clone(), config.upstream.timeout)
                    .map_err(|e| GatewayError::Internal {
                        message: format!("Failed to create upstream client: {e}"),
                    })?;
                Arc::new(client) as Arc<dyn DynRestTransport>
            }
        };

        let filter = ContentFilter::new().map_err(|e| GatewayError::Internal {
            message: format!("Failed to compile content filters: {e}"),
        })?;
        let headers = SecurityHeaders::new(&config.upstream.url, config.environment)?;
        let schema = build_schema(UpstreamApi::new(transport), &config, &policy);

        tracing::info!(
            environment = %config.environment,
            upstream = %config.upstream.url,
            credential_transport = %config.upstream.credential_transport,
            max_payload_bytes = policy.max_payload_bytes,
            "gateway configured"
        );

        let state = GatewayState {
            jwt: Arc::new(JwtVerifier::new(&config.auth.jwt_secret)),
            limiters: Arc::new(Limiters::new(&policy)),
            headers: Arc::new(headers),
            filter: Arc::new(filter),
            policy: Arc::new(policy),
            config: Arc::new(config),
            schema,
        };
        Ok(Gateway { state })
    }
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }

    /// The router with every middleware stage installed.
    pub fn router(&self) -> Result<Router, GatewayError> {
        gateway_router(self.state.clone())
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(self, listener: tokio::net::TcpListener) -> Result<(), GatewayError> {
        let router = self.router()?;
        if let Ok(local) = listener.local_addr() {
            tracing::info!(address = %local, "gateway listening");
        }
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| GatewayError::Internal {
            message: format!("Server error: {e}"),
        })
    }
}
