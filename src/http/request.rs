//! Request identification and access-log spans.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) unless the caller sent one
//! - Open one span per request carrying method, redacted URI and request ID
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The query string is redacted before it reaches the span; `code` and
//!   `id_token` never appear in access logs

use axum::{body::Body, http::HeaderName, http::Request};
use tracing::Span;

use crate::observability::logging::redact_query;

pub const X_REQUEST_ID: &str = "x-request-id";

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Request ID set by the request-id layer, if any.
pub fn request_id(request: &Request<Body>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span for `TraceLayer::make_span_with`.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let uri = request.uri();
    let target = match uri.query() {
        Some(query) => format!("{}?{}", uri.path(), redact_query(query)),
        None => uri.path().to_string(),
    };

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %target,
        request_id = %request_id(request),
    )
}
