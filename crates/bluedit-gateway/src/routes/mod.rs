pub mod health;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::GatewayError;
use crate::graphql::{graphql_handler, graphql_playground};
use crate::middleware::{auth, jwt, operation, payload, rate_limit, sanitize, security};
use crate::state::GatewayState;

/// Routes without middleware or state applied.
///
/// `POST /` is the GraphQL endpoint and carries the mutation auth gate;
/// `GET /` serves GraphiQL outside production.
pub fn gateway_routes(playground: bool) -> Router<GatewayState> {
    let graphql = if playground {
        post(graphql_handler).get(graphql_playground)
    } else {
        post(graphql_handler)
    };
    Router::new()
        .route(
            "/",
            graphql.route_layer(from_fn(auth::require_auth_for_mutations)),
        )
        .route("/health", get(health::health))
}

/// CORS for the configured frontend origin, with credentials.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, GatewayError> {
    let origin = HeaderValue::from_str(origin).map_err(|_| GatewayError::Internal {
        message: format!("CORS origin '{origin}' is not a valid header value"),
    })?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]))
}

/// The full application: routes wrapped in the request pipeline.
///
/// Layers run outermost first in the reverse of the order they are added
/// here: tracing, security headers, security logging, CORS, payload guard,
/// sanitization, GraphQL inspection, JWT, slow-down, rate limiting.
pub fn gateway_router(state: GatewayState) -> Result<Router, GatewayError> {
    let cors = cors_layer(&state.config.server.cors_origin)?;
    let playground = !state.config.environment.is_production();

    Ok(gateway_routes(playground)
        .layer(from_fn_with_state(state.clone(), rate_limit::rate_limit))
        .layer(from_fn_with_state(state.clone(), rate_limit::slow_down))
        .layer(from_fn_with_state(state.clone(), jwt::authenticate_jwt))
        .layer(from_fn(operation::inspect_graphql))
        .layer(from_fn_with_state(state.clone(), sanitize::sanitize_body))
        .layer(from_fn_with_state(state.clone(), payload::limit_payload))
        .layer(cors)
        .layer(from_fn_with_state(state.clone(), security::security_logging))
        .layer(from_fn_with_state(state.clone(), security::security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
