//! GraphQL backend-for-frontend over the Bluedit REST API.
//!
//! The gateway accepts GraphQL on `POST /`, runs every request through a
//! security pipeline (see [`middleware`]) and resolves fields by calling the
//! REST backend through [`upstream::UpstreamApi`].

pub mod app;
pub mod config;
pub mod error;
pub mod graphql;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod upstream;

pub use app::{Gateway, GatewayBuilder};
pub use config::{ConfigError, Environment, GatewayConfig, SecurityPolicy};
pub use error::{FieldError, GatewayError};
pub use identity::Identity;
