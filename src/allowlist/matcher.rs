//! State matching.
//!
//! # Design Decisions
//! - Linear scan over the host's bucket, entries then patterns, in stored order
//! - First match wins
//! - Wildcard patterns are plain string prefixes of the raw `state`, not
//!   path-segment aware: `https://a.com/foo*` matches `https://a.com/foobar`
//! - Non-wildcard patterns require exact string equality

use thiserror::Error;
use url::Url;

use crate::allowlist::compiler::split_wildcard;
use crate::allowlist::types::{CompiledAllowlist, MatchResult};
use crate::allowlist::hosts::{host_key, to_long_url};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("state must be in the form of a URL: {0}")]
    NotAUrl(String),

    #[error("Invalid host in state url: {0}")]
    BadHost(String),

    #[error("state must match a valid whitelist pattern: {0}")]
    NoPatternMatch(String),
}

/// Resolve `state` against the allowlist.
pub fn match_state(state: &str, allowlist: &CompiledAllowlist) -> Result<MatchResult, MatchError> {
    let url = Url::parse(state).map_err(|_| MatchError::NotAUrl(state.to_string()))?;
    let domain = host_key(&url).ok_or_else(|| MatchError::BadHost(state.to_string()))?;
    let entries = allowlist
        .bucket(&domain)
        .ok_or_else(|| MatchError::BadHost(state.to_string()))?;

    for entry in entries {
        for pattern in &entry.patterns {
            let (raw, wildcard) = split_wildcard(pattern);
            let full = to_long_url(&domain, raw);

            let matched = if wildcard {
                state.starts_with(&full)
            } else {
                state == full
            };

            if matched {
                return Ok(MatchResult {
                    pattern: if wildcard { format!("{}*", full) } else { full },
                    client_name: entry.client_name.clone(),
                    login_url: entry.login_url.as_deref().map(|u| to_long_url(&domain, u)),
                    domain,
                });
            }
        }
    }

    Err(MatchError::NoPatternMatch(state.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::compiler::compile;
    use crate::allowlist::types::ClientPatternSpec;

    fn spec(name: &str, login_url: Option<&str>, patterns: &[&str]) -> ClientPatternSpec {
        ClientPatternSpec {
            client_name: name.to_string(),
            login_url: login_url.map(String::from),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn sample() -> CompiledAllowlist {
        compile(&[
            spec("client name", Some("https://url1.com/login"), &["https://url1.com/withPath*", "https://url1.com"]),
            spec("client 2", None, &["https://url2.com?*"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_wildcard_match_resolves_login_url() {
        let result = match_state("https://url1.com/withPath/abc?q=xyz", &sample()).unwrap();
        assert_eq!(result.domain, "https://url1.com");
        assert_eq!(result.client_name, "client name");
        assert_eq!(result.pattern, "https://url1.com/withPath*");
        assert_eq!(result.login_url.as_deref(), Some("https://url1.com/login"));
    }

    #[test]
    fn test_wildcard_is_plain_string_prefix() {
        // Crosses the path-segment boundary on purpose.
        let result = match_state("https://url1.com/withPathology", &sample()).unwrap();
        assert_eq!(result.pattern, "https://url1.com/withPath*");

        let result = match_state("https://url2.com?q=xyz", &sample()).unwrap();
        assert_eq!(result.client_name, "client 2");
        assert_eq!(result.login_url, None);
    }

    #[test]
    fn test_exact_pattern_requires_equality() {
        let result = match_state("https://url1.com", &sample()).unwrap();
        assert_eq!(result.pattern, "https://url1.com");

        let err = match_state("https://url1.com/other", &sample()).unwrap_err();
        assert_eq!(err, MatchError::NoPatternMatch("https://url1.com/other".into()));

        // Raw string comparison: the parser's trailing slash does not count.
        assert!(match_state("https://url1.com/", &sample()).is_err());
    }

    #[test]
    fn test_unknown_host_and_non_url() {
        let err = match_state("https://example.com/login/callback", &sample()).unwrap_err();
        assert_eq!(err, MatchError::BadHost("https://example.com/login/callback".into()));

        let err = match_state("mailto:someone@url1.com", &sample()).unwrap_err();
        assert!(matches!(err, MatchError::BadHost(_)));

        let err = match_state("bad", &sample()).unwrap_err();
        assert_eq!(err.to_string(), "state must be in the form of a URL: bad");
    }

    #[test]
    fn test_first_match_wins_across_clients_on_host() {
        let allowlist = compile(&[
            spec("broad", Some("https://h.com/broad-login"), &["https://h.com/app*"]),
            spec("narrow", Some("https://h.com/narrow-login"), &["https://h.com/app/admin*"]),
            spec("other", None, &["https://h.com/other"]),
        ])
        .unwrap();

        let result = match_state("https://h.com/app/admin/x", &allowlist).unwrap();
        assert_eq!(result.client_name, "broad");
        assert_eq!(result.login_url.as_deref(), Some("https://h.com/broad-login"));

        let result = match_state("https://h.com/other", &allowlist).unwrap();
        assert_eq!(result.client_name, "other");
    }

    #[test]
    fn test_clients_do_not_leak_across_hosts() {
        let allowlist = compile(&[
            spec("a", None, &["https://a.com/*"]),
            spec("b", None, &["https://b.com/*"]),
        ])
        .unwrap();

        assert_eq!(match_state("https://b.com/x", &allowlist).unwrap().client_name, "b");
        // A path that spells out another host still resolves against its own host.
        assert!(match_state("https://c.com/https://a.com/", &allowlist).is_err());
    }
}
