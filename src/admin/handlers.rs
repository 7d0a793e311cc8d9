use axum::{
    body::Bytes,
    extract::State,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::admin::auth::{require_scope, AdminClaims, SCOPE_READ, SCOPE_UPDATE};
use crate::admin::error::ApiError;
use crate::allowlist::hosts::parse_absolute;
use crate::allowlist::{compile, expand, validate_specs, AllowlistDocument, ClientPatternSpec};
use crate::codes::ErrorCode;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::storage::StoreError;

#[derive(Serialize)]
pub struct ServiceMeta {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorPageBody {
    error_page: Option<Value>,
}

/// `PUT /api`: replace the allowlist.
pub async fn put_allowlist(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    body: Bytes,
) -> Result<Json<Vec<ClientPatternSpec>>, ApiError> {
    require_scope(&claims, SCOPE_UPDATE)?;

    let specs: Vec<ClientPatternSpec> = serde_json::from_slice(&body).map_err(|e| {
        tracing::info!(error = %e, "Failed attempt to update allowlist");
        metrics::record_allowlist_update("invalid");
        ApiError::invalid(ErrorCode::InvalidSchema, e)
    })?;
    validate_specs(&specs).map_err(|e| {
        tracing::info!(error = %e, "Failed attempt to update allowlist");
        metrics::record_allowlist_update("invalid");
        ApiError::invalid(ErrorCode::InvalidSchema, e)
    })?;
    let compiled = compile(&specs).map_err(|e| {
        tracing::info!(error = %e, "Failed attempt to update allowlist");
        metrics::record_allowlist_update("invalid");
        ApiError::invalid(ErrorCode::InvalidAllowlist, e)
    })?;

    let version = update_document(&state, |doc| doc.host_to_pattern = compiled).await?;

    tracing::info!(sub = %claims.sub, clients = specs.len(), version, "Allowlist updated");
    Ok(Json(specs))
}

/// `GET /api`: the allowlist as absolute client specs.
pub async fn get_allowlist(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
) -> Result<Json<Vec<ClientPatternSpec>>, ApiError> {
    require_scope(&claims, SCOPE_READ)?;

    let current = state.store.read().await.map_err(|e| {
        tracing::error!(error_code = %ErrorCode::CouldNotReadStorage, error = %e, "Failed to read allowlist from storage");
        ApiError::Internal(ErrorCode::CouldNotReadStorage)
    })?;

    Ok(Json(expand(&current.data.host_to_pattern)))
}

/// `PUT /api/error-page`: set the error page stored next to the allowlist.
pub async fn put_error_page(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    require_scope(&claims, SCOPE_UPDATE)?;

    let parsed: ErrorPageBody = serde_json::from_slice(&body)
        .map_err(|e| ApiError::invalid(ErrorCode::InvalidSchema, e))?;

    let error_page = match parsed.error_page {
        None | Some(Value::Null) => {
            return Err(ApiError::invalid(ErrorCode::MissingErrorPage, "errorPage is required"))
        }
        Some(Value::String(page)) if is_web_url(&page) => page,
        Some(Value::String(page)) => {
            return Err(ApiError::invalid(
                ErrorCode::BadErrorPage,
                format!("errorPage must be in the format of a URL: {}", page),
            ))
        }
        Some(other) => {
            return Err(ApiError::invalid(
                ErrorCode::BadErrorPage,
                format!("errorPage must be in the format of a URL: {}", other),
            ))
        }
    };

    let page = error_page.clone();
    let version = update_document(&state, move |doc| doc.error_page = Some(page)).await?;
    state.error_pages.invalidate();

    tracing::info!(sub = %claims.sub, error_page = %error_page, version, "Error page updated");
    Ok(Json(serde_json::json!({ "errorPage": error_page })))
}

/// `GET /meta`.
pub async fn get_meta() -> Json<ServiceMeta> {
    Json(ServiceMeta {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        description: env!("CARGO_PKG_DESCRIPTION"),
    })
}

fn is_web_url(value: &str) -> bool {
    parse_absolute(value).is_some_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Read-modify-write of the stored document at the version that was read.
/// A concurrent writer turns into a 409; there is no retry.
async fn update_document<F>(state: &AppState, modify: F) -> Result<u64, ApiError>
where
    F: FnOnce(&mut AllowlistDocument),
{
    let current = state.store.read().await.map_err(|e| {
        tracing::error!(error = %e, "Could not read storage before update");
        metrics::record_allowlist_update("error");
        ApiError::Internal(ErrorCode::CouldNotUpdateStorage)
    })?;

    let mut document = current.data;
    modify(&mut document);

    match state.store.write(&document, current.version).await {
        Ok(version) => {
            state.allowlist.invalidate();
            metrics::record_allowlist_update("success");
            Ok(version)
        }
        Err(StoreError::Conflict { expected, actual }) => {
            tracing::warn!(expected, actual, "Rejected conflicting allowlist update");
            metrics::record_allowlist_update("conflict");
            Err(ApiError::Conflict)
        }
        Err(e) => {
            tracing::error!(error_code = %ErrorCode::CouldNotUpdateStorage, error = %e, "Could not update storage");
            metrics::record_allowlist_update("error");
            Err(ApiError::Internal(ErrorCode::CouldNotUpdateStorage))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_web_url() {
        assert!(is_web_url("https://error.page/x"));
        assert!(is_web_url("http://localhost:8080"));
        assert!(!is_web_url("ftp://files.example.com"));
        assert!(!is_web_url("/relative"));
        assert!(!is_web_url("not a url"));
    }
}
