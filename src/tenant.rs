//! Tenant error-page lookup.
//!
//! The persisted document's `errorPage` is the primary source; when it is
//! unset the resolver asks an [`ErrorPageSource`] for the tenant's configured
//! error page (cached by [`crate::redirect::cache::ErrorPageCache`]).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::{IdentityConfig, TenantConfig};

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("management API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("management API returned {0}")]
    Status(reqwest::StatusCode),
}

#[async_trait]
pub trait ErrorPageSource: Send + Sync {
    /// The tenant's error page URL, `None` when the tenant has none.
    async fn error_page(&self) -> Result<Option<String>, TenantError>;
}

/// Fixed error page, e.g. from configuration.
pub struct StaticErrorPage(pub Option<String>);

#[async_trait]
impl ErrorPageSource for StaticErrorPage {
    async fn error_page(&self) -> Result<Option<String>, TenantError> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct ManagementToken {
    access_token: String,
}

#[derive(Deserialize)]
struct TenantSettings {
    error_page: Option<ErrorPageSetting>,
}

#[derive(Deserialize)]
struct ErrorPageSetting {
    url: Option<String>,
}

/// Reads `error_page.url` from the tenant settings through the management API,
/// authenticating with a client-credentials grant.
pub struct ManagementApiErrorPage {
    client: reqwest::Client,
    issuer: String,
    client_id: String,
    client_secret: String,
}

impl ManagementApiErrorPage {
    pub fn new(identity: &IdentityConfig, tenant: &TenantConfig) -> Result<Self, TenantError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(tenant.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            issuer: identity.issuer(),
            client_id: tenant.management_client_id.clone(),
            client_secret: tenant.management_client_secret.clone(),
        })
    }

    async fn access_token(&self) -> Result<String, TenantError> {
        let response = self
            .client
            .post(format!("{}/oauth/token", self.issuer))
            .json(&serde_json::json!({
                "grant_type": "client_credentials",
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "audience": format!("{}/api/v2/", self.issuer),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TenantError::Status(response.status()));
        }
        Ok(response.json::<ManagementToken>().await?.access_token)
    }
}

#[async_trait]
impl ErrorPageSource for ManagementApiErrorPage {
    async fn error_page(&self) -> Result<Option<String>, TenantError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(format!("{}/api/v2/tenants/settings", self.issuer))
            .query(&[("fields", "error_page")])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TenantError::Status(response.status()));
        }

        let settings: TenantSettings = response.json().await?;
        Ok(settings
            .error_page
            .and_then(|page| page.url)
            .filter(|url| !url.is_empty()))
    }
}
