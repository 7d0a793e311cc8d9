//! IdP-initiated SSO redirector.
//!
//! Accepts logins started at an identity provider, checks the `state`
//! parameter against a per-host allowlist and redirects to the matched
//! application's login page. Anything that fails the allowlist goes to the
//! tenant's error page instead.

// Domain
pub mod allowlist;
pub mod assertion;
pub mod codes;
pub mod redirect;
pub mod storage;
pub mod tenant;

// Surfaces
pub mod admin;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::RedirectorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
