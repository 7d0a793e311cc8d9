//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;
use tower::ServiceExt;

use idp_redirector::admin::JwtAdminAuthenticator;
use idp_redirector::allowlist::AllowlistDocument;
use idp_redirector::assertion::{AssertionError, AssertionVerifier, Principal};
use idp_redirector::config::RedirectorConfig;
use idp_redirector::http::{HttpServer, Services};
use idp_redirector::storage::{DocumentStore, MemoryStore, StoreError, StoreResult, Versioned};
use idp_redirector::tenant::{ErrorPageSource, StaticErrorPage};

pub const ADMIN_SECRET: &str = "admin-secret";
pub const ISSUER: &str = "https://tenant.example.com";

pub fn test_config() -> RedirectorConfig {
    let mut config = RedirectorConfig::default();
    config.identity.domain = "tenant.example.com".into();
    config.identity.client_id = "redirector-client".into();
    config.identity.client_secret = "client-secret".into();
    config.admin.signing_secret = ADMIN_SECRET.into();
    config
}

/// Verifier that accepts the literal tokens `good-token` and `good-code`.
pub struct StubVerifier;

#[async_trait]
impl AssertionVerifier for StubVerifier {
    async fn verify_id_token(&self, id_token: &str) -> Result<Principal, AssertionError> {
        if id_token == "good-token" {
            Ok(Principal {
                sub: "auth0|token-user".into(),
                claims: Value::Null,
            })
        } else {
            Err(AssertionError::BadIdToken("signature mismatch".into()))
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<Principal, AssertionError> {
        match code {
            "good-code" => Ok(Principal {
                sub: "auth0|code-user".into(),
                claims: Value::Null,
            }),
            "forbidden-code" => Err(AssertionError::Forbidden),
            _ => Err(AssertionError::Internal("token endpoint unavailable".into())),
        }
    }
}

/// Reads like an empty store but loses every write to a concurrent writer.
pub struct ConflictingStore;

#[async_trait]
impl DocumentStore for ConflictingStore {
    async fn read(&self) -> StoreResult<Versioned<AllowlistDocument>> {
        Ok(Versioned::default())
    }

    async fn write(&self, _document: &AllowlistDocument, expected_version: u64) -> StoreResult<u64> {
        Err(StoreError::Conflict {
            expected: expected_version,
            actual: expected_version + 1,
        })
    }
}

/// Memory store whose first `writers` reads all return before any of them
/// can write, so every writer starts from the same version.
pub struct LockstepStore {
    inner: MemoryStore,
    barrier: Barrier,
    writers: usize,
    reads: AtomicUsize,
}

impl LockstepStore {
    pub fn new(writers: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            barrier: Barrier::new(writers),
            writers,
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DocumentStore for LockstepStore {
    async fn read(&self) -> StoreResult<Versioned<AllowlistDocument>> {
        let snapshot = self.inner.read().await;
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.writers {
            self.barrier.wait().await;
        }
        snapshot
    }

    async fn write(&self, document: &AllowlistDocument, expected_version: u64) -> StoreResult<u64> {
        self.inner.write(document, expected_version).await
    }
}

/// Store whose backing medium is gone.
pub struct BrokenStore;

#[async_trait]
impl DocumentStore for BrokenStore {
    async fn read(&self) -> StoreResult<Versioned<AllowlistDocument>> {
        Ok(Versioned::default())
    }

    async fn write(&self, _document: &AllowlistDocument, _expected_version: u64) -> StoreResult<u64> {
        Err(StoreError::Io(std::io::Error::other("disk full")))
    }
}

/// Store that can not be read at all.
pub struct UnreadableStore;

#[async_trait]
impl DocumentStore for UnreadableStore {
    async fn read(&self) -> StoreResult<Versioned<AllowlistDocument>> {
        Err(StoreError::Io(std::io::Error::other("permission denied")))
    }

    async fn write(&self, _document: &AllowlistDocument, _expected_version: u64) -> StoreResult<u64> {
        Err(StoreError::Io(std::io::Error::other("permission denied")))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn DocumentStore>,
}

pub fn app_with(store: Arc<dyn DocumentStore>, tenant_error_page: Option<&str>) -> TestApp {
    let config = test_config();
    let error_page_source: Option<Arc<dyn ErrorPageSource>> =
        Some(Arc::new(StaticErrorPage(tenant_error_page.map(String::from))));

    let services = Services {
        store: store.clone(),
        verifier: Arc::new(StubVerifier),
        error_page_source,
        authenticator: Arc::new(JwtAdminAuthenticator::new(&config.admin)),
    };

    TestApp {
        router: HttpServer::new(&config, services).router(),
        store,
    }
}

pub fn app() -> TestApp {
    app_with(Arc::new(MemoryStore::new()), None)
}

/// Admin JWT carrying `scope`.
pub fn admin_token(scope: &str) -> String {
    let claims = serde_json::json!({
        "sub": "admin@clients",
        "aud": "urn:idp-redirector-api",
        "scope": scope,
        "exp": chrono::Utc::now().timestamp() + 600,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(ADMIN_SECRET.as_bytes()),
    )
    .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> url::Url {
        let location = self
            .headers
            .get(header::LOCATION)
            .expect("response has a Location header")
            .to_str()
            .unwrap();
        url::Url::parse(location).unwrap()
    }

    pub fn query(&self) -> Vec<(String, String)> {
        self.location().query_pairs().into_owned().collect()
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_request(uri: &str, form: &[(&str, &str)]) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form)
        .finish();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub fn pair(k: &str, v: &str) -> (String, String) {
    (k.to_string(), v.to_string())
}

/// The worked allowlist from the product documentation.
pub fn sample_allowlist() -> Value {
    serde_json::json!([
        {
            "clientName": "client name",
            "loginUrl": "https://url1.com/login",
            "patterns": ["https://url1.com/withPath*", "https://url1.com"]
        },
        {
            "clientName": "client 2",
            "patterns": ["https://url2.com?*"]
        }
    ])
}

/// Install `allowlist` through the admin API.
pub async fn install_allowlist(app: &TestApp, allowlist: &Value) {
    let token = admin_token("update:patterns");
    let response = send(&app.router, json_request("PUT", "/api", Some(&token), allowlist)).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
}
