//! Authorization code exchange against the tenant's token endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::assertion::{AssertionError, AssertionVerifier, IdTokenValidator, Principal};
use crate::config::IdentityConfig;

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
}

/// Verifier backed by the identity tenant: validates id_tokens locally and
/// exchanges authorization codes at `<issuer>/oauth/token`.
pub struct TenantAssertionVerifier {
    client: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    validator: IdTokenValidator,
}

impl TenantAssertionVerifier {
    pub fn new(config: &IdentityConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.exchange_timeout_secs))
            .build()?;
        let issuer = config.issuer();

        Ok(Self {
            client,
            token_endpoint: format!("{}/oauth/token", issuer),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.public_url.clone(),
            validator: IdTokenValidator::new(&config.client_secret, &config.client_id, &issuer),
        })
    }
}

#[async_trait]
impl AssertionVerifier for TenantAssertionVerifier {
    async fn verify_id_token(&self, id_token: &str) -> Result<Principal, AssertionError> {
        self.validator.validate(id_token)
    }

    async fn exchange_code(&self, code: &str) -> Result<Principal, AssertionError> {
        let request = TokenRequest {
            grant_type: "authorization_code",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_uri,
            code,
        };

        let response = self
            .client
            .post(&self.token_endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AssertionError::Internal(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(AssertionError::Forbidden);
        }
        if !status.is_success() {
            tracing::debug!(status = %status, "Token endpoint rejected code exchange");
            return Err(AssertionError::Internal(format!("token endpoint returned {}", status)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AssertionError::Internal(e.to_string()))?;
        let id_token = body.id_token.ok_or(AssertionError::MissingIdToken)?;

        self.validator.validate(&id_token)
    }
}
