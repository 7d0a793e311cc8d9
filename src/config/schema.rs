//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the redirector.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the redirector.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RedirectorConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Identity tenant this redirector belongs to.
    pub identity: IdentityConfig,

    /// Admin API authentication.
    pub admin: AdminConfig,

    /// Where the allowlist document lives.
    pub storage: StorageConfig,

    /// Process-local caches.
    pub cache: CacheConfig,

    /// Tenant error-page lookup.
    pub tenant: TenantConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_bytes: 500 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Identity tenant settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Tenant domain (e.g., "tenant.auth0.com"). A full `http(s)://` origin
    /// is accepted as well.
    pub domain: String,

    /// Client id of the redirector application.
    pub client_id: String,

    /// Client secret of the redirector application. Prefer the
    /// `REDIRECTOR_CLIENT_SECRET` environment variable.
    pub client_secret: String,

    /// Public URL of this service, sent as `redirect_uri` on code exchange.
    pub public_url: String,

    /// Token endpoint timeout in seconds.
    pub exchange_timeout_secs: u64,
}

impl IdentityConfig {
    /// Issuer URL sent as `iss` on every successful redirect.
    pub fn issuer(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        if domain.starts_with("https://") || domain.starts_with("http://") {
            domain.to_string()
        } else {
            format!("https://{}", domain)
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            public_url: String::new(),
            exchange_timeout_secs: 10,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Expected `aud` of admin bearer tokens.
    pub audience: String,

    /// HS256 secret admin bearer tokens are signed with. Prefer the
    /// `REDIRECTOR_ADMIN_SECRET` environment variable.
    pub signing_secret: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            audience: "urn:idp-redirector-api".to_string(),
            signing_secret: String::new(),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Document path for the file backend.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: "data.json".to_string(),
        }
    }
}

/// Cache lifetimes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a loaded allowlist document is served before re-reading.
    pub allowlist_ttl_secs: u64,

    /// How long a fetched tenant error page is reused.
    pub error_page_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            allowlist_ttl_secs: 60,
            error_page_ttl_secs: 300,
        }
    }
}

/// Tenant error-page lookup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TenantConfig {
    /// Fetch the error page from the tenant settings when the document has none.
    pub fetch_error_page: bool,

    /// Management API client used for the lookup.
    pub management_client_id: String,

    /// Prefer the `REDIRECTOR_MANAGEMENT_CLIENT_SECRET` environment variable.
    pub management_client_secret: String,

    /// Management API timeout in seconds.
    pub request_timeout_secs: u64,

    /// Fallback error page when lookup is disabled.
    pub error_page: Option<String>,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            fetch_error_page: false,
            management_client_id: String::new(),
            management_client_secret: String::new(),
            request_timeout_secs: 10,
            error_page: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml() {
        let config: RedirectorConfig = toml::from_str(
            r#"
            [identity]
            domain = "tenant.example.com"
            client_id = "abc"

            [storage]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.identity.issuer(), "https://tenant.example.com");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.listener.max_body_bytes, 500 * 1024);
        assert_eq!(config.admin.audience, "urn:idp-redirector-api");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_issuer_accepts_origin() {
        let identity = IdentityConfig {
            domain: "http://127.0.0.1:4000/".into(),
            ..Default::default()
        };
        assert_eq!(identity.issuer(), "http://127.0.0.1:4000");
    }
}
