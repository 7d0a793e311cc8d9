//! Audit records for redirect requests.
//!
//! One record per request, emitted as a single JSON payload on the `audit`
//! tracing target so it can be routed separately from diagnostic logs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::codes::ErrorCode;

pub const AUDIT_TARGET: &str = "audit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    RedirectorSuccessfulRedirect,
    RedirectorForwardError,
    RedirectorBadUserExchange,
    RedirectorFailedRedirect,
    RedirectorInternalError,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::RedirectorSuccessfulRedirect => "redirector_successful_redirect",
            AuditKind::RedirectorForwardError => "redirector_forward_error",
            AuditKind::RedirectorBadUserExchange => "redirector_bad_user_exchange",
            AuditKind::RedirectorFailedRedirect => "redirector_failed_redirect",
            AuditKind::RedirectorInternalError => "redirector_internal_error",
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, AuditKind::RedirectorSuccessfulRedirect)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub log_id: Uuid,
    #[serde(serialize_with = "rfc3339")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: AuditKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub details: serde_json::Value,
}

fn rfc3339<S: serde::Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl AuditRecord {
    pub fn new(kind: AuditKind, description: impl Into<String>) -> Self {
        Self {
            log_id: Uuid::new_v4(),
            date: Utc::now(),
            kind,
            description: description.into(),
            error_code: None,
            ip: None,
            user_agent: None,
            user_id: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.error_code = Some(code);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Write the record to the `audit` target.
    pub fn emit(&self) {
        let payload = match serde_json::to_string(self) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, kind = self.kind.as_str(), "Failed to serialize audit record");
                return;
            }
        };

        if self.kind.is_error() {
            tracing::error!(target: AUDIT_TARGET, kind = self.kind.as_str(), record = %payload);
        } else {
            tracing::info!(target: AUDIT_TARGET, kind = self.kind.as_str(), record = %payload);
        }
    }
}
