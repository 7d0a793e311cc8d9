//! Redirect subsystem.
//!
//! # Data Flow
//! ```text
//! GET|POST / (state, code, id_token, error, error_description)
//!     → handler.rs (query/body extraction, request context)
//!     → resolver.rs
//!         AllowlistCache → match_state → AssertionVerifier
//!         → login URL with iss / target_link_uri / error params
//!         or error page (ErrorPageCache) / local 500
//!     → 302 + one audit record
//! ```
//!
//! # Design Decisions
//! - The request path never takes a lock; it reads a cached `Arc` snapshot
//! - A failed identity assertion never blocks the redirect, it is reported
//!   to the login page as `error`/`error_description`

pub mod cache;
pub mod handler;
pub mod resolver;

pub use cache::{AllowlistCache, ErrorPageCache};
pub use resolver::{RedirectParams, RedirectResponse, Redirector, RequestContext, Resolution};
