//! Inbound identity assertions.
//!
//! # Data Flow
//! ```text
//! redirect request
//!     id_token → verify_id_token (signature, audience, issuer)
//!     code     → exchange_code (token endpoint) → verify_id_token
//!     → Principal | AssertionError
//! ```
//!
//! # Design Decisions
//! - A failed assertion never aborts the redirect; the resolver downgrades it
//!   to `error`/`error_description` query parameters
//! - Failures are classified so only a stable code travels in the URL

pub mod exchange;
pub mod id_token;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::codes::ErrorCode;

pub use exchange::TenantAssertionVerifier;
pub use id_token::IdTokenValidator;

/// Verified identity behind a redirect request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub sub: String,
    #[serde(skip)]
    pub claims: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionError {
    /// The token endpoint refused the code.
    #[error("code exchange was forbidden")]
    Forbidden,

    /// The token endpoint answered without an id_token.
    #[error("token response did not contain an id_token")]
    MissingIdToken,

    #[error("invalid id_token: {0}")]
    BadIdToken(String),

    #[error("assertion verification failed: {0}")]
    Internal(String),
}

impl AssertionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AssertionError::Forbidden => ErrorCode::ExchangeForbidden,
            AssertionError::MissingIdToken => ErrorCode::ExchangeMissingIdToken,
            AssertionError::BadIdToken(_) => ErrorCode::BadIdToken,
            AssertionError::Internal(_) => ErrorCode::ExchangeInternal,
        }
    }

    /// Short classification used in audit records.
    pub fn reason(&self) -> &'static str {
        match self {
            AssertionError::Forbidden => "forbidden",
            AssertionError::MissingIdToken => "missing_id_token",
            AssertionError::BadIdToken(_) => "bad_id_token",
            AssertionError::Internal(_) => "internal",
        }
    }
}

/// Verifies the identity assertion carried by a redirect request.
#[async_trait]
pub trait AssertionVerifier: Send + Sync {
    async fn verify_id_token(&self, id_token: &str) -> Result<Principal, AssertionError>;

    async fn exchange_code(&self, code: &str) -> Result<Principal, AssertionError>;
}
