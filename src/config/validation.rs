//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required identity settings present
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - URLs that end up in redirects are absolute
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RedirectorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::allowlist::hosts::parse_absolute;
use crate::config::schema::{RedirectorConfig, StorageBackend};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &RedirectorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.identity.domain.is_empty() {
        errors.push(ValidationError::new("identity.domain", "is required"));
    }
    if config.identity.client_id.is_empty() {
        errors.push(ValidationError::new("identity.client_id", "is required"));
    }
    if config.identity.client_secret.is_empty() {
        errors.push(ValidationError::new(
            "identity.client_secret",
            "is required (set REDIRECTOR_CLIENT_SECRET)",
        ));
    }
    if !config.identity.public_url.is_empty() && parse_absolute(&config.identity.public_url).is_none() {
        errors.push(ValidationError::new("identity.public_url", "must be an absolute URL"));
    }

    if config.admin.signing_secret.is_empty() {
        errors.push(ValidationError::new(
            "admin.signing_secret",
            "is required (set REDIRECTOR_ADMIN_SECRET)",
        ));
    }

    if config.storage.backend == StorageBackend::File && config.storage.path.is_empty() {
        errors.push(ValidationError::new("storage.path", "is required for the file backend"));
    }

    if config.tenant.fetch_error_page
        && (config.tenant.management_client_id.is_empty()
            || config.tenant.management_client_secret.is_empty())
    {
        errors.push(ValidationError::new(
            "tenant",
            "management_client_id and management_client_secret are required when fetch_error_page is enabled",
        ));
    }
    if let Some(page) = &config.tenant.error_page {
        if parse_absolute(page).is_none() {
            errors.push(ValidationError::new("tenant.error_page", "must be an absolute URL"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
