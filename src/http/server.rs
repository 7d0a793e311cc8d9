//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, timeout)
//! - Build the collaborators (store, verifier, error-page source) from config
//! - Serve until the shutdown signal fires

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{self, AdminAuthenticator, JwtAdminAuthenticator};
use crate::assertion::{AssertionVerifier, TenantAssertionVerifier};
use crate::config::{RedirectorConfig, StorageBackend};
use crate::http::request::{make_request_span, request_id_header};
use crate::redirect::handler::{redirect_get, redirect_post};
use crate::redirect::{AllowlistCache, ErrorPageCache, Redirector};
use crate::storage::{DocumentStore, FileStore, MemoryStore};
use crate::tenant::{ErrorPageSource, ManagementApiErrorPage, StaticErrorPage, TenantError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build token client: {0}")]
    Verifier(#[from] reqwest::Error),

    #[error("failed to build management API client: {0}")]
    Tenant(#[from] TenantError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Collaborators the server is assembled from.
pub struct Services {
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<dyn AssertionVerifier>,
    pub error_page_source: Option<Arc<dyn ErrorPageSource>>,
    pub authenticator: Arc<dyn AdminAuthenticator>,
}

impl Services {
    /// Production collaborators described by `config`.
    pub fn from_config(config: &RedirectorConfig) -> Result<Self, ServerError> {
        let store: Arc<dyn DocumentStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File => Arc::new(FileStore::new(&config.storage.path)),
        };

        let error_page_source: Option<Arc<dyn ErrorPageSource>> = if config.tenant.fetch_error_page {
            Some(Arc::new(ManagementApiErrorPage::new(&config.identity, &config.tenant)?))
        } else {
            config
                .tenant
                .error_page
                .clone()
                .map(|page| Arc::new(StaticErrorPage(Some(page))) as Arc<dyn ErrorPageSource>)
        };

        Ok(Self {
            store,
            verifier: Arc::new(TenantAssertionVerifier::new(&config.identity)?),
            error_page_source,
            authenticator: Arc::new(JwtAdminAuthenticator::new(&config.admin)),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub redirector: Arc<Redirector>,
    pub store: Arc<dyn DocumentStore>,
    pub allowlist: Arc<AllowlistCache>,
    pub error_pages: Arc<ErrorPageCache>,
    pub authenticator: Arc<dyn AdminAuthenticator>,
}

/// HTTP server for the redirector.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &RedirectorConfig, services: Services) -> Self {
        let allowlist = Arc::new(AllowlistCache::new(Duration::from_secs(
            config.cache.allowlist_ttl_secs,
        )));
        let error_pages = Arc::new(ErrorPageCache::new(
            services.error_page_source,
            Duration::from_secs(config.cache.error_page_ttl_secs),
        ));
        let redirector = Arc::new(Redirector::new(
            services.store.clone(),
            allowlist.clone(),
            error_pages.clone(),
            services.verifier,
            config.identity.issuer(),
        ));

        let state = AppState {
            redirector,
            store: services.store,
            allowlist,
            error_pages,
            authenticator: services.authenticator,
        };

        Self {
            router: Self::build_router(config, state),
        }
    }

    pub fn from_config(config: &RedirectorConfig) -> Result<Self, ServerError> {
        Ok(Self::new(config, Services::from_config(config)?))
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RedirectorConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(redirect_get).post(redirect_post))
            .route("/meta", get(admin::handlers::get_meta))
            .with_state(state.clone())
            .merge(admin::setup_admin_router(state))
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuid))
    }

    /// The fully layered router, e.g. for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
