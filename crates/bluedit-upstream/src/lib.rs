//! REST client for the Bluedit backend.
//!
//! [`RestTransport`] is the seam the gateway depends on; [`RestClient`] is the
//! `reqwest` implementation used in production.

pub mod client;
pub mod credential;
pub mod error;
pub mod traits;

pub use client::RestClient;
pub use credential::{Credential, CredentialTransport};
pub use error::UpstreamError;
pub use traits::{RestRequest, RestTransport};
