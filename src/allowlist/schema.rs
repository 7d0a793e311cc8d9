//! Schema validation for submitted allowlists.
//!
//! Runs before compilation. Checks shape constraints only (lengths, required
//! fields, wildcard placement); URL parsing happens in the compiler.

use thiserror::Error;

use crate::allowlist::types::ClientPatternSpec;

pub const CLIENT_NAME_MIN: usize = 1;
pub const CLIENT_NAME_MAX: usize = 200;
pub const URL_MIN: usize = 10;
pub const URL_MAX: usize = 1024;

/// First schema violation found, with the JSON path of the offending value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("\"{path}\" length must be at least {min} characters long")]
    TooShort { path: String, min: usize },

    #[error("\"{path}\" length must be less than or equal to {max} characters long")]
    TooLong { path: String, max: usize },

    #[error("\"{path}\" must contain at least 1 items")]
    Empty { path: String },

    #[error("\"{path}\" with value \"{value}\" may only contain a single wildcard (*) at the end")]
    Wildcard { path: String, value: String },
}

/// Validate every spec, returning the first violation.
pub fn validate_specs(specs: &[ClientPatternSpec]) -> Result<(), SchemaError> {
    for (i, spec) in specs.iter().enumerate() {
        check_length(
            &format!("[{}].clientName", i),
            &spec.client_name,
            CLIENT_NAME_MIN,
            CLIENT_NAME_MAX,
        )?;

        if let Some(login_url) = &spec.login_url {
            check_length(&format!("[{}].loginUrl", i), login_url, URL_MIN, URL_MAX)?;
        }

        if spec.patterns.is_empty() {
            return Err(SchemaError::Empty {
                path: format!("[{}].patterns", i),
            });
        }

        for (j, pattern) in spec.patterns.iter().enumerate() {
            let path = format!("[{}].patterns[{}]", i, j);
            check_length(&path, pattern, URL_MIN, URL_MAX)?;
            if !has_valid_wildcard(pattern) {
                return Err(SchemaError::Wildcard {
                    path,
                    value: pattern.clone(),
                });
            }
        }
    }
    Ok(())
}

/// `^[^*]*\*?$`: at most one `*`, and only as the last character.
pub fn has_valid_wildcard(pattern: &str) -> bool {
    let body = pattern.strip_suffix('*').unwrap_or(pattern);
    !body.contains('*')
}

/// Lengths are UTF-16 code units, so characters outside the BMP count twice.
fn check_length(path: &str, value: &str, min: usize, max: usize) -> Result<(), SchemaError> {
    let len = value.encode_utf16().count();
    if len < min {
        return Err(SchemaError::TooShort {
            path: path.to_string(),
            min,
        });
    }
    if len > max {
        return Err(SchemaError::TooLong {
            path: path.to_string(),
            max,
        });
    }
    Ok(())
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
    fn test_valid_specs() {
        let specs = vec![
            spec("client name", Some("https://url1.com/login"), &["https://url1.com", "https://url1.com/withPath*"]),
            spec("client 2", None, &["https://url2.com?*"]),
        ];
        assert!(validate_specs(&specs).is_ok());
        assert!(validate_specs(&[]).is_ok());
    }

    #[test]
    fn test_wildcard_placement() {
        assert!(has_valid_wildcard("https://a.com/x*"));
        assert!(has_valid_wildcard("https://a.com/x"));
        assert!(!has_valid_wildcard("https://a.com/*x"));
        assert!(!has_valid_wildcard("https://a.com/x**"));
        assert!(!has_valid_wildcard("https://*.a.com/x"));

        let err = validate_specs(&[spec("c", None, &["https://*.a.com/x"])]).unwrap_err();
        assert!(matches!(err, SchemaError::Wildcard { ref path, .. } if path == "[0].patterns[0]"));
    }

    #[test]
    fn test_length_bounds() {
        let err = validate_specs(&[spec("", None, &["https://a.com"])]).unwrap_err();
        assert_eq!(err.to_string(), "\"[0].clientName\" length must be at least 1 characters long");

        let long_name = "n".repeat(201);
        let err = validate_specs(&[spec(&long_name, None, &["https://a.com"])]).unwrap_err();
        assert!(matches!(err, SchemaError::TooLong { max: 200, .. }));

        let err = validate_specs(&[spec("c", Some("http://a"), &["https://a.com"])]).unwrap_err();
        assert!(matches!(err, SchemaError::TooShort { ref path, .. } if path == "[0].loginUrl"));

        // 101 astral characters are 202 code units.
        let wide_name = "\u{1F600}".repeat(100);
        assert!(validate_specs(&[spec(&wide_name, None, &["https://a.com"])]).is_ok());
        let wide_name = "\u{1F600}".repeat(101);
        let err = validate_specs(&[spec(&wide_name, None, &["https://a.com"])]).unwrap_err();
        assert!(matches!(err, SchemaError::TooLong { max: 200, .. }));

        let long_pattern = format!("https://a.com/{}", "p".repeat(1024));
        let err = validate_specs(&[spec("c", None, &[&long_pattern])]).unwrap_err();
        assert!(matches!(err, SchemaError::TooLong { max: 1024, .. }));
    }

    #[test]
    fn test_patterns_required() {
        let err = validate_specs(&[spec("ok", None, &[]), spec("c", None, &[])]).unwrap_err();
        assert_eq!(err, SchemaError::Empty { path: "[0].patterns".into() });
    }
}
