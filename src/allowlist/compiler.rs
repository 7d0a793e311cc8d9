//! Pattern compiler.
//!
//! Turns submitted client specs into the host-indexed allowlist. Compilation
//! is all-or-nothing: the first invalid pattern aborts it and nothing is
//! returned for the caller to persist.

use thiserror::Error;

use crate::allowlist::types::{ClientPatternSpec, CompiledAllowlist, CompiledClientEntry};
use crate::allowlist::hosts::{host_key, parse_absolute, to_short_url};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("loginUrl must be in the format of a URL: {0}")]
    InvalidLoginUrl(String),

    #[error("pattern must be in the format of a URL: {0}")]
    InvalidPattern(String),

    #[error("pattern can not have a wildcard as part of the hostname: {0}")]
    WildcardHostname(String),
}

/// Compile specs in submission order.
pub fn compile(specs: &[ClientPatternSpec]) -> Result<CompiledAllowlist, PatternError> {
    let mut allowlist = CompiledAllowlist::new();

    for spec in specs {
        if let Some(login_url) = &spec.login_url {
            if parse_absolute(login_url).is_none() {
                return Err(PatternError::InvalidLoginUrl(login_url.clone()));
            }
        }

        for pattern in &spec.patterns {
            let (raw, wildcard) = split_wildcard(pattern);
            let url = parse_absolute(raw)
                .ok_or_else(|| PatternError::InvalidPattern(pattern.clone()))?;
            let base = host_key(&url)
                .ok_or_else(|| PatternError::InvalidPattern(pattern.clone()))?;

            if wildcard && raw == base {
                return Err(PatternError::WildcardHostname(pattern.clone()));
            }

            let bucket = allowlist.bucket_mut(&base);
            let i = match bucket.iter().position(|e| e.client_name == spec.client_name) {
                Some(i) => i,
                None => {
                    let mut entry = CompiledClientEntry::new(spec.client_name.clone());
                    entry.login_url = spec.login_url.as_deref().map(|u| to_short_url(&base, u));
                    bucket.push(entry);
                    bucket.len() - 1
                }
            };
            bucket[i].patterns.push(to_short_url(&base, pattern));
        }
    }

    Ok(allowlist)
}

/// Split a pattern into its wildcard-free part and whether it ended in `*`.
pub fn split_wildcard(pattern: &str) -> (&str, bool) {
    match pattern.strip_suffix('*') {
        Some(raw) => (raw, true),
        None => (pattern, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, login_url: Option<&str>, patterns: &[&str]) -> ClientPatternSpec {
        ClientPatternSpec {
            client_name: name.to_string(),
            login_url: login_url.map(String::from),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_compile_relativizes_by_host() {
        let allowlist = compile(&[
            spec("client name", Some("https://url1.com/login"), &["https://url1.com/withPath*", "https://url1.com"]),
            spec("client 2", None, &["https://url2.com?*"]),
        ])
        .unwrap();

        let expected = serde_json::json!({
            "https://url1.com": [
                { "clientName": "client name", "loginUrl": "/login", "patterns": ["/withPath*", ""] }
            ],
            "https://url2.com": [
                { "clientName": "client 2", "patterns": ["?*"] }
            ]
        });
        assert_eq!(serde_json::to_value(&allowlist).unwrap(), expected);
    }

    #[test]
    fn test_compile_keeps_foreign_login_url_absolute() {
        let allowlist = compile(&[spec(
            "client name 3",
            Some("https://url3.com/login"),
            &["https://url1.com/otherPath*", "https://url3.com/withPath*"],
        )])
        .unwrap();

        let url1 = allowlist.bucket("https://url1.com").unwrap();
        assert_eq!(url1[0].login_url.as_deref(), Some("https://url3.com/login"));
        assert_eq!(url1[0].patterns, vec!["/otherPath*"]);

        let url3 = allowlist.bucket("https://url3.com").unwrap();
        assert_eq!(url3[0].login_url.as_deref(), Some("/login"));
        assert_eq!(url3[0].patterns, vec!["/withPath*"]);
    }

    #[test]
    fn test_compile_keeps_login_url_on_lookalike_host_absolute() {
        let allowlist = compile(&[spec("c", Some("https://a.cox:1/login"), &["https://a.co/p*"])]).unwrap();

        let bucket = allowlist.bucket("https://a.co").unwrap();
        assert_eq!(bucket[0].login_url.as_deref(), Some("https://a.cox:1/login"));
        assert_eq!(bucket[0].patterns, vec!["/p*"]);

        let result = crate::allowlist::matcher::match_state("https://a.co/page", &allowlist).unwrap();
        assert_eq!(result.login_url.as_deref(), Some("https://a.cox:1/login"));
    }

    #[test]
    fn test_compile_merges_same_client_per_host() {
        let allowlist = compile(&[
            spec("a", None, &["https://h.com/one"]),
            spec("b", None, &["https://h.com/two"]),
            spec("a", Some("https://h.com/ignored"), &["https://h.com/three", "https://h.com/one"]),
        ])
        .unwrap();

        let bucket = allowlist.bucket("https://h.com").unwrap();
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket[0].client_name, "a");
        // First occurrence decides loginUrl; duplicates are kept.
        assert_eq!(bucket[0].login_url, None);
        assert_eq!(bucket[0].patterns, vec!["/one", "/three", "/one"]);
        assert_eq!(bucket[1].patterns, vec!["/two"]);
    }

    #[test]
    fn test_compile_rejects_host_wildcard() {
        for pattern in ["https://url1.com*", "https://some.host.com:12345*"] {
            let err = compile(&[spec("c", None, &[pattern])]).unwrap_err();
            assert_eq!(err, PatternError::WildcardHostname(pattern.to_string()));
            assert_eq!(
                err.to_string(),
                format!("pattern can not have a wildcard as part of the hostname: {}", pattern)
            );
        }

        // A path or query after the host is fine.
        assert!(compile(&[spec("c", None, &["https://url1.com/*", "https://url1.com?*"])]).is_ok());
    }

    #[test]
    fn test_compile_rejects_non_urls() {
        let err = compile(&[spec("c", None, &["not a url at all"])]).unwrap_err();
        assert_eq!(err, PatternError::InvalidPattern("not a url at all".into()));

        let err = compile(&[spec("c", None, &["/relative/path*"])]).unwrap_err();
        assert!(matches!(err, PatternError::InvalidPattern(_)));

        let err = compile(&[spec("c", Some("login page"), &["https://a.com"])]).unwrap_err();
        assert_eq!(err.to_string(), "loginUrl must be in the format of a URL: login page");
    }

    #[test]
    fn test_compile_keeps_port_in_host_key() {
        let allowlist = compile(&[spec(
            "a long client name",
            Some("https://some.host.com:12345/login"),
            &["https://some.host.com:12345", "https://some.host.com:12345/*"],
        )])
        .unwrap();

        let bucket = allowlist.bucket("https://some.host.com:12345").unwrap();
        assert_eq!(bucket[0].login_url.as_deref(), Some("/login"));
        assert_eq!(bucket[0].patterns, vec!["", "/*"]);
    }
}
