//! `GET|POST /` handlers.

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Instant;

use crate::codes::ErrorCode;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::redirect::resolver::{RedirectParams, RedirectResponse, RequestContext};

/// Redirect parameters from the query string.
pub async fn redirect_get(State(state): State<AppState>, request: Request) -> Response {
    let (parts, _) = request.into_parts();
    let query = query_pairs(parts.uri.query());
    let ctx = request_context(&parts.headers, &parts.extensions, query, Vec::new());
    let params = RedirectParams::from_pairs(&ctx.query);

    respond(&state, params, ctx).await
}

/// Redirect parameters from a form or JSON body, with the query string as
/// fallback for keys the body does not carry.
pub async fn redirect_post(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read redirect request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let body = match body_pairs(&parts.headers, &bytes) {
        Ok(pairs) => pairs,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed JSON redirect body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_request", "error_description": "Malformed JSON body" })),
            )
                .into_response();
        }
    };

    let query = query_pairs(parts.uri.query());
    let ctx = request_context(&parts.headers, &parts.extensions, query, body);

    let mut merged = ctx.body.clone();
    merged.extend(ctx.query.iter().cloned());
    let params = RedirectParams::from_pairs(&merged);

    respond(&state, params, ctx).await
}

async fn respond(state: &AppState, params: RedirectParams, ctx: RequestContext) -> Response {
    let start = Instant::now();
    let resolution = state.redirector.resolve(&params, &ctx).await;
    resolution.audit.emit();
    metrics::record_redirect(resolution.outcome(), start);

    match resolution.response {
        RedirectResponse::Redirect(location) => {
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        RedirectResponse::InternalError => internal_error(),
    }
}

/// `500` answered when no error page is available.
pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "error_description": ErrorCode::ErrorPageNotConfigured.describe("Internal Server Error"),
        })),
    )
        .into_response()
}

fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn body_pairs(headers: &HeaderMap, bytes: &Bytes) -> Result<Vec<(String, String)>, serde_json::Error> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if !is_json {
        return Ok(url::form_urlencoded::parse(bytes).into_owned().collect());
    }

    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Object(map) = value else {
        return Ok(Vec::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
            other => Some((k, other.to_string())),
        })
        .collect())
}

fn request_context(
    headers: &HeaderMap,
    extensions: &axum::http::Extensions,
    query: Vec<(String, String)>,
    body: Vec<(String, String)>,
) -> RequestContext {
    let header = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());
    let ip = forwarded_for.or_else(|| {
        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    });

    RequestContext {
        ip,
        user_agent: header(header::USER_AGENT),
        accept_language: header(header::ACCEPT_LANGUAGE),
        query,
        body,
    }
}
