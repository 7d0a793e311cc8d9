//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Redact sensitive request parameters before they reach a log line
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and `RUST_LOG`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Parameters whose values never appear in logs.
pub const REDACTED_PARAMS: &[&str] = &["code", "id_token", "client_secret"];
pub const REDACTED: &str = "*****";

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("idp_redirector={lvl},audit={lvl},tower_http={lvl}", lvl = config.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

pub fn is_redacted(key: &str) -> bool {
    REDACTED_PARAMS.contains(&key)
}

/// Copy of `pairs` with sensitive values masked.
pub fn redact_pairs(pairs: &[(String, String)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| {
            let value = if is_redacted(k) { REDACTED.to_string() } else { v.clone() };
            (k.clone(), value)
        })
        .collect()
}

/// Redact a raw query string, e.g. for access logs.
pub fn redact_query(query: &str) -> String {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(redact_pairs(&pairs))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_query() {
        assert_eq!(
            redact_query("state=https%3A%2F%2Furl1.com&code=secretcode"),
            "state=https%3A%2F%2Furl1.com&code=*****"
        );
        assert_eq!(redact_query(""), "");
        assert_eq!(redact_query("id_token=abc&x=1"), "id_token=*****&x=1");
    }

    #[test]
    fn test_redact_pairs_leaves_input_untouched() {
        let pairs = vec![("code".to_string(), "abc".to_string())];
        let redacted = redact_pairs(&pairs);
        assert_eq!(redacted[0].1, REDACTED);
        assert_eq!(pairs[0].1, "abc");
    }
}
