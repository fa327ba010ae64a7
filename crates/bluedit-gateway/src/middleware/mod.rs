//! The request pipeline in front of the GraphQL endpoint.
//!
//! Each stage is an independent axum middleware. The router installs them in
//! this order (outermost first): security headers, security logging, CORS,
//! payload guard, body sanitization, GraphQL inspection, JWT extraction,
//! slow-down, rate limiting. The auth gate wraps the routes themselves.

pub mod auth;
pub mod jwt;
pub mod operation;
pub mod payload;
pub mod rate_limit;
pub mod sanitize;
pub mod security;
pub mod throttle;
