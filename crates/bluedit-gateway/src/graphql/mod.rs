pub mod context;
pub mod mutation;
pub mod query;
pub mod types;
pub mod validation;

use async_graphql::http::GraphiQLSource;
use async_graphql::{EmptySubscription, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse};

use self::context::{RequestContext, ResolverSettings};
use self::mutation::MutationRoot;
use self::query::QueryRoot;
use crate::config::{GatewayConfig, SecurityPolicy};
use crate::identity::OptionalIdentity;
use crate::state::GatewayState;
use crate::upstream::UpstreamApi;

pub type BlueditSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the executable schema with the upstream API and resolver settings
/// attached as schema data.
pub fn build_schema(
    api: UpstreamApi,
    config: &GatewayConfig,
    policy: &SecurityPolicy,
) -> BlueditSchema {
    let settings = ResolverSettings {
        cookie: config.auth.cookie.clone(),
        transport: config.upstream.credential_transport,
    };
    let mut builder = Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(api)
        .data(settings)
        .limit_depth(policy.max_query_depth)
        .limit_complexity(policy.max_query_complexity);
    if config.environment.is_production() {
        builder = builder.disable_introspection();
    }
    builder.finish()
}

/// GraphQL POST handler.
pub async fn graphql_handler(
    State(state): State<GatewayState>,
    OptionalIdentity(identity): OptionalIdentity,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let request = req.into_inner().data(RequestContext::new(headers, identity));
    state.schema.execute(request).await.into()
}

/// GraphiQL playground GET handler.
pub async fn graphql_playground() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/").finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn sdl_names_roots_and_camel_cases_fields() {
        let api = UpstreamApi::new(std::sync::Arc::new(NoTransport));
        let config = GatewayConfig::default();
        let schema = build_schema(api, &config, &SecurityPolicy::defaults(Environment::Development));
        let sdl = schema.sdl();
        assert!(sdl.contains("type Query"));
        assert!(sdl.contains("type Mutation"));
        assert!(sdl.contains("union Voteable"));
        assert!(sdl.contains("avatarUrl"));
        assert!(sdl.contains("parentComment"));
        assert!(sdl.contains("subblueditByName"));
        assert!(sdl.contains("signInWithGoogle"));
        assert!(!sdl.contains("avatar_url"));
    }

    struct NoTransport;

    impl bluedit_upstream::RestTransport for NoTransport {
        async fn send(
            &self,
            _request: bluedit_upstream::RestRequest,
        ) -> Result<serde_json::Value, bluedit_upstream::UpstreamError> {
            Err(bluedit_upstream::UpstreamError::NoResponse)
        }
    }
}
