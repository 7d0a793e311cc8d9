//! Admin API.
//!
//! # Routes
//! ```text
//! PUT /api             update:patterns   replace the allowlist
//! GET /api             read:patterns     read it back in absolute form
//! PUT /api/error-page  update:patterns   set the error page
//! ```
//!
//! Every route sits behind [`auth::admin_auth_middleware`]; scopes are
//! checked per handler.

pub mod auth;
pub mod error;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub use auth::{AdminAuthenticator, AdminClaims, JwtAdminAuthenticator};
pub use error::ApiError;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/api", get(get_allowlist).put(put_allowlist))
        .route("/api/error-page", put(put_error_page))
        .layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}
