use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bluedit_upstream::{RestRequest, RestTransport, UpstreamError};
use serde_json::Value;

use crate::config::{GatewayConfig, SecurityPolicy};
use crate::graphql::BlueditSchema;
use crate::identity::JwtVerifier;
use crate::middleware::rate_limit::Limiters;
use crate::middleware::sanitize::ContentFilter;
use crate::middleware::security::SecurityHeaders;

/// Object-safe wrapper for `RestTransport`.
///
/// RPITIT traits cannot be used as `dyn Trait`. This wrapper uses boxed futures
/// so the transport can live in shared router state.
pub trait DynRestTransport: Send + Sync {
    fn send(
        &self,
        request: RestRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Value, UpstreamError>> + Send + '_>>;
}

/// Blanket impl: any concrete `RestTransport` automatically implements `DynRestTransport`.
impl<T: RestTransport + 'static> DynRestTransport for T {
    fn send(
        &self,
        request: RestRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Value, UpstreamError>> + Send + '_>> {
        Box::pin(RestTransport::send(self, request))
    }
}

/// Shared state for every middleware stage and handler.
///
/// Cheap to clone: every field is reference-counted.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<GatewayConfig>,
    pub policy: Arc<SecurityPolicy>,
    pub jwt: Arc<JwtVerifier>,
    pub limiters: Arc<Limiters>,
    pub headers: Arc<SecurityHeaders>,
    pub filter: Arc<ContentFilter>,
    pub schema: BlueditSchema,
}
