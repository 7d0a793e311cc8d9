//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, environment secrets)
//!     → validation.rs (semantic checks)
//!     → RedirectorConfig (validated, immutable)
//!     → handed to HttpServer::from_config at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets can come from the environment instead of the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::RedirectorConfig;
pub use schema::{
    AdminConfig, CacheConfig, IdentityConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    StorageBackend, StorageConfig, TenantConfig, TimeoutConfig,
};
