//! Redirect resolution.
//!
//! Each stage takes an immutable input and returns an immutable output:
//!
//! ```text
//! RedirectParams → MatchedTarget → AssertionOutcome → Resolution
//! ```
//!
//! Any failure before the assertion stage short-circuits to the error path,
//! which redirects to the error page or answers with a local 500.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use url::Url;

use crate::allowlist::hosts::parse_absolute;
use crate::allowlist::{match_state, MatchError, MatchResult};
use crate::assertion::{AssertionError, AssertionVerifier, Principal};
use crate::codes::ErrorCode;
use crate::observability::audit::{AuditKind, AuditRecord};
use crate::observability::logging::redact_pairs;
use crate::redirect::cache::{AllowlistCache, ErrorPageCache};
use crate::storage::DocumentStore;

/// Parameters of a redirect request. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    pub state: Option<String>,
    pub code: Option<String>,
    pub id_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl RedirectParams {
    /// Build from decoded key/value pairs; the first non-empty value per key wins.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, v)| k == key && !v.is_empty())
                .map(|(_, v)| v.clone())
        };

        Self {
            state: get("state"),
            code: get("code"),
            id_token: get("id_token"),
            error: get("error"),
            error_description: get("error_description"),
        }
    }

    fn has_upstream_error(&self) -> bool {
        self.error.is_some() || self.error_description.is_some()
    }
}

/// Request metadata that only feeds the audit record and the error page.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub accept_language: Option<String>,
    pub query: Vec<(String, String)>,
    pub body: Vec<(String, String)>,
}

impl RequestContext {
    /// Request parameters for audit details, sensitive values masked.
    fn audit_request(&self) -> Value {
        let mut request = Map::new();
        if !self.query.is_empty() {
            request.insert("query".into(), pairs_to_json(&redact_pairs(&self.query)));
        }
        if !self.body.is_empty() {
            request.insert("body".into(), pairs_to_json(&redact_pairs(&self.body)));
        }
        Value::Object(request)
    }

    fn audit(&self, record: AuditRecord) -> AuditRecord {
        AuditRecord {
            ip: self.ip.clone(),
            user_agent: self.user_agent.clone(),
            ..record
        }
    }
}

fn pairs_to_json(pairs: &[(String, String)]) -> Value {
    Value::Object(
        pairs
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// What the handler should send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectResponse {
    /// `302 Found` to this location.
    Redirect(String),
    /// `500` with the IE001 body.
    InternalError,
}

/// Final outcome of a redirect request, with its single audit record.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub response: RedirectResponse,
    pub audit: AuditRecord,
}

impl Resolution {
    /// Metric label for this outcome.
    pub fn outcome(&self) -> &'static str {
        match self.audit.kind {
            AuditKind::RedirectorSuccessfulRedirect => "success",
            AuditKind::RedirectorForwardError => "forward_error",
            AuditKind::RedirectorBadUserExchange => "bad_user_exchange",
            AuditKind::RedirectorFailedRedirect => "failed_redirect",
            AuditKind::RedirectorInternalError => "internal_error",
        }
    }
}

/// A state that passed the allowlist.
#[derive(Debug, Clone)]
struct MatchedTarget {
    state: String,
    matched: MatchResult,
    login_url: String,
}

#[derive(Debug, Clone, Default)]
struct AssertionOutcome {
    principal: Option<Principal>,
    error: Option<AssertionError>,
}

/// An error destined for the error page.
#[derive(Debug, Clone)]
struct RedirectFailure {
    code: ErrorCode,
    error: &'static str,
    description: String,
}

impl RedirectFailure {
    fn missing_state() -> Self {
        Self {
            code: ErrorCode::MissingState,
            error: "invalid_request",
            description: "Missing state parameter".to_string(),
        }
    }
}

impl From<MatchError> for RedirectFailure {
    fn from(err: MatchError) -> Self {
        let (code, error) = match err {
            MatchError::NotAUrl(_) => (ErrorCode::StateMustBeUrl, "invalid_request"),
            MatchError::BadHost(_) => (ErrorCode::StateInvalidHost, "invalid_host"),
            MatchError::NoPatternMatch(_) => (ErrorCode::StateDidNotMatchPattern, "invalid_request"),
        };
        Self {
            code,
            error,
            description: err.to_string(),
        }
    }
}

/// Resolves redirect requests against the allowlist.
pub struct Redirector {
    store: Arc<dyn DocumentStore>,
    allowlist: Arc<AllowlistCache>,
    error_pages: Arc<ErrorPageCache>,
    verifier: Arc<dyn AssertionVerifier>,
    issuer: String,
}

impl Redirector {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        allowlist: Arc<AllowlistCache>,
        error_pages: Arc<ErrorPageCache>,
        verifier: Arc<dyn AssertionVerifier>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            store,
            allowlist,
            error_pages,
            verifier,
            issuer: issuer.into(),
        }
    }

    pub async fn resolve(&self, params: &RedirectParams, ctx: &RequestContext) -> Resolution {
        let document = self.allowlist.get(self.store.as_ref()).await;

        let target = match Self::validate_state(params, &document.host_to_pattern) {
            Ok(target) => target,
            Err(failure) => {
                return self
                    .fail(failure, document.error_page.as_deref(), ctx)
                    .await
            }
        };

        let assertion = self.assert_identity(params).await;
        self.finish(params, target, assertion, ctx)
    }

    fn validate_state(
        params: &RedirectParams,
        allowlist: &crate::allowlist::CompiledAllowlist,
    ) -> Result<MatchedTarget, RedirectFailure> {
        let state = params.state.as_deref().ok_or_else(RedirectFailure::missing_state)?;
        let matched = match_state(state, allowlist)?;
        let login_url = matched.login_url.clone().unwrap_or_else(|| state.to_string());

        Ok(MatchedTarget {
            state: state.to_string(),
            matched,
            login_url,
        })
    }

    async fn assert_identity(&self, params: &RedirectParams) -> AssertionOutcome {
        let result = if let Some(id_token) = &params.id_token {
            self.verifier.verify_id_token(id_token).await
        } else if let Some(code) = &params.code {
            self.verifier.exchange_code(code).await
        } else {
            return AssertionOutcome::default();
        };

        match result {
            Ok(principal) => AssertionOutcome {
                principal: Some(principal),
                error: None,
            },
            Err(e) => {
                tracing::debug!(reason = e.reason(), error = %e, "Identity assertion failed");
                AssertionOutcome {
                    principal: None,
                    error: Some(e),
                }
            }
        }
    }

    fn finish(
        &self,
        params: &RedirectParams,
        target: MatchedTarget,
        assertion: AssertionOutcome,
        ctx: &RequestContext,
    ) -> Resolution {
        let mut overrides: Vec<(&str, String)> = vec![
            ("iss", self.issuer.clone()),
            ("target_link_uri", target.state.clone()),
        ];
        if params.has_upstream_error() {
            if let Some(error) = &params.error {
                overrides.push(("error", error.clone()));
            }
            if let Some(description) = &params.error_description {
                overrides.push(("error_description", description.clone()));
            }
        } else if let Some(e) = &assertion.error {
            overrides.push(("error", "invalid_request".to_string()));
            overrides.push(("error_description", e.code().describe("Invalid User Code")));
        }

        let user_id = assertion.principal.as_ref().map(|p| p.sub.clone());

        let url = match compose_login_url(&target.login_url, &overrides) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(login_url = %target.login_url, error = %e, "Stored loginUrl is not a valid URL");
                let record = AuditRecord::new(AuditKind::RedirectorInternalError, "Stored loginUrl is not a valid URL")
                    .with_code(ErrorCode::InvalidStoredLoginUrl)
                    .with_details(json!({
                        "matched": target.matched,
                        "request": ctx.audit_request(),
                    }));
                return Resolution {
                    response: RedirectResponse::InternalError,
                    audit: AuditRecord { user_id, ..ctx.audit(record) },
                };
            }
        };

        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let details = json!({
            "matched": target.matched,
            "request": ctx.audit_request(),
            "response": {
                "location": target.login_url,
                "query": pairs_to_json(&query),
            },
        });

        let record = if assertion.error.is_some() {
            AuditRecord::new(AuditKind::RedirectorBadUserExchange, "Error Redirect")
                .with_code(ErrorCode::UserExchangeFailed)
        } else if params.has_upstream_error() {
            AuditRecord::new(AuditKind::RedirectorForwardError, "Error Redirect")
                .with_code(ErrorCode::ForwardingErrors)
        } else {
            AuditRecord::new(AuditKind::RedirectorSuccessfulRedirect, "Successful Redirect")
        };

        Resolution {
            response: RedirectResponse::Redirect(url.to_string()),
            audit: AuditRecord {
                user_id,
                ..ctx.audit(record.with_details(details))
            },
        }
    }

    async fn fail(
        &self,
        failure: RedirectFailure,
        document_error_page: Option<&str>,
        ctx: &RequestContext,
    ) -> Resolution {
        let query = error_page_query(&failure, ctx.accept_language.as_deref());

        let error_page = match document_error_page {
            Some(page) => Some(page.to_string()),
            None => self.error_pages.get().await,
        };

        let location = error_page.as_deref().and_then(|page| {
            let url = compose_error_page_url(page, &query);
            if url.is_none() {
                tracing::error!(error_page = %page, "Configured error page is not a valid URL");
            }
            url
        });

        match location {
            Some(location) => {
                let record = AuditRecord::new(
                    AuditKind::RedirectorFailedRedirect,
                    "Failed to redirect after IdP Initiated Login",
                )
                .with_code(failure.code)
                .with_details(json!({
                    "request": ctx.audit_request(),
                    "response": { "location": location, "query": pairs_to_json(&query) },
                }));
                Resolution {
                    response: RedirectResponse::Redirect(location),
                    audit: ctx.audit(record),
                }
            }
            None => {
                let record = AuditRecord::new(
                    AuditKind::RedirectorInternalError,
                    "Error page has not been configured",
                )
                .with_code(ErrorCode::ErrorPageNotConfigured)
                .with_details(json!({
                    "request": ctx.audit_request(),
                    "failed_redirect": {
                        "error_code": failure.code,
                        "query": pairs_to_json(&query),
                    },
                }));
                Resolution {
                    response: RedirectResponse::InternalError,
                    audit: ctx.audit(record),
                }
            }
        }
    }
}

fn error_page_query(failure: &RedirectFailure, accept_language: Option<&str>) -> Vec<(String, String)> {
    vec![
        ("client_id".to_string(), String::new()),
        ("connection".to_string(), String::new()),
        ("lang".to_string(), accept_language.unwrap_or_default().to_string()),
        ("error".to_string(), failure.error.to_string()),
        ("error_description".to_string(), failure.code.describe(&failure.description)),
    ]
}

/// `login_url` with `overrides` applied to its query.
///
/// Existing pairs keep their order. An override replaces the first pair with
/// the same key and drops any later duplicates; new keys are appended.
pub fn compose_login_url(login_url: &str, overrides: &[(&str, String)]) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(login_url)?;
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    for (key, value) in overrides {
        match pairs.iter().position(|(k, _)| k == key) {
            Some(first) => {
                pairs[first].1 = value.clone();
                let mut index = 0;
                pairs.retain(|(k, _)| {
                    let keep = index <= first || k != key;
                    index += 1;
                    keep
                });
            }
            None => pairs.push((key.to_string(), value.clone())),
        }
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&pairs);
    }
    Ok(url)
}

/// The error page with its query replaced by `query`. `None` when the page
/// is not an absolute URL.
pub fn compose_error_page_url(error_page: &str, query: &[(String, String)]) -> Option<String> {
    let mut url = parse_absolute(error_page)?;
    url.query_pairs_mut().clear().extend_pairs(query);
    Some(url.to_string())
}
