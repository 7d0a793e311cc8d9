//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::RedirectorConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_CLIENT_SECRET: &str = "REDIRECTOR_CLIENT_SECRET";
pub const ENV_ADMIN_SECRET: &str = "REDIRECTOR_ADMIN_SECRET";
pub const ENV_MANAGEMENT_CLIENT_SECRET: &str = "REDIRECTOR_MANAGEMENT_CLIENT_SECRET";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// Secrets may be supplied through the environment instead of the file.
pub fn load_config(path: &Path) -> Result<RedirectorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: RedirectorConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay secrets from the environment (non-empty values win).
pub fn apply_env_overrides<F>(config: &mut RedirectorConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(secret) = get(ENV_CLIENT_SECRET) {
        config.identity.client_secret = secret;
    }
    if let Some(secret) = get(ENV_ADMIN_SECRET) {
        config.admin.signing_secret = secret;
    }
    if let Some(secret) = get(ENV_MANAGEMENT_CLIENT_SECRET) {
        config.tenant.management_client_secret = secret;
    }
}
