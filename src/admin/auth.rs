//! Bearer-token authentication for the admin API.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::admin::error::ApiError;
use crate::config::AdminConfig;

pub const SCOPE_READ: &str = "read:patterns";
pub const SCOPE_UPDATE: &str = "update:patterns";

/// Claims of an authenticated admin caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    /// Space-separated scopes.
    #[serde(default)]
    pub scope: String,
    pub exp: i64,
}

impl AdminClaims {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.split_whitespace().any(|s| s == scope)
    }
}

/// 403 unless `claims` carry `scope`.
pub fn require_scope(claims: &AdminClaims, scope: &str) -> Result<(), ApiError> {
    if claims.has_scope(scope) {
        Ok(())
    } else {
        tracing::info!(sub = %claims.sub, required = scope, "Admin request rejected for missing scope");
        Err(ApiError::InsufficientScope)
    }
}

pub trait AdminAuthenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<AdminClaims, ApiError>;
}

/// Accepts HS256 JWTs issued for the admin audience.
pub struct JwtAdminAuthenticator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAdminAuthenticator {
    pub fn new(config: &AdminConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.as_str()]);
        validation.leeway = 60;

        Self {
            key: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            validation,
        }
    }
}

impl AdminAuthenticator for JwtAdminAuthenticator {
    fn authenticate(&self, token: &str) -> Result<AdminClaims, ApiError> {
        decode::<AdminClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Admin token rejected");
                ApiError::Unauthorized("Invalid token".to_string())
            })
    }
}

/// Authenticates the bearer token and stores [`AdminClaims`] in the request
/// extensions for the handlers.
pub async fn admin_auth_middleware(
    State(authenticator): State<Arc<dyn AdminAuthenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        return ApiError::Unauthorized("No authorization token was found".to_string()).into_response();
    };

    match authenticator.authenticate(token.trim()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
