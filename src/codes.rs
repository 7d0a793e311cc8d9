//! Stable error codes.
//!
//! Every user-facing error description is prefixed with one of these codes,
//! e.g. `[RE003] state must match a valid whitelist pattern: ...`. Log parsers
//! and downstream tooling key on them, so the string values never change.

use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Redirect endpoint
    MissingState,
    StateInvalidHost,
    StateDidNotMatchPattern,
    StateMustBeUrl,
    BadIdToken,
    ForwardingErrors,
    UserExchangeFailed,

    // Admin API
    UpdateConflict,
    InvalidSchema,
    InvalidAllowlist,
    BadErrorPage,
    MissingErrorPage,

    // Internal
    ErrorPageNotConfigured,
    CouldNotUpdateStorage,
    FailedFetchingErrorPage,
    CouldNotReadStorage,
    InvalidStoredLoginUrl,

    // Authorization code exchange
    ExchangeForbidden,
    ExchangeMissingIdToken,
    ExchangeInternal,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingState => "RE001",
            ErrorCode::StateInvalidHost => "RE002",
            ErrorCode::StateDidNotMatchPattern => "RE003",
            ErrorCode::StateMustBeUrl => "RE004",
            ErrorCode::BadIdToken => "RE005",
            ErrorCode::ForwardingErrors => "RE006",
            ErrorCode::UserExchangeFailed => "RE007",
            ErrorCode::UpdateConflict => "AE001",
            ErrorCode::InvalidSchema => "AE002",
            ErrorCode::InvalidAllowlist => "AE003",
            ErrorCode::BadErrorPage => "AE004",
            ErrorCode::MissingErrorPage => "AE005",
            ErrorCode::ErrorPageNotConfigured => "IE001",
            ErrorCode::CouldNotUpdateStorage => "IE002",
            ErrorCode::FailedFetchingErrorPage => "IE003",
            ErrorCode::CouldNotReadStorage => "IE004",
            ErrorCode::InvalidStoredLoginUrl => "IE005",
            ErrorCode::ExchangeForbidden => "CE001",
            ErrorCode::ExchangeMissingIdToken => "CE002",
            ErrorCode::ExchangeInternal => "CE003",
        }
    }

    /// Prefix a description with this code: `[CODE] description`.
    pub fn describe(&self, description: impl fmt::Display) -> String {
        format!("[{}] {}", self.as_str(), description)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_prefixes_code() {
        assert_eq!(
            ErrorCode::StateDidNotMatchPattern.describe("state must match a valid whitelist pattern: x"),
            "[RE003] state must match a valid whitelist pattern: x"
        );
        assert_eq!(
            ErrorCode::ErrorPageNotConfigured.describe("Internal Server Error"),
            "[IE001] Internal Server Error"
        );
    }

    #[test]
    fn test_serializes_as_code_string() {
        let json = serde_json::to_string(&ErrorCode::UpdateConflict).unwrap();
        assert_eq!(json, "\"AE001\"");
    }
}
