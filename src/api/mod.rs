//! REST API for the Bindery daemon.
//!
//! Provides HTTP endpoints for:
//! - Publication listing, metadata and covers
//! - Installment listing and page bytes
//! - Categories and their members
//! - Explicit library rescans
//!
//! Publications are addressed by their ordinal in the current
//! [`CatalogSnapshot`], or by stable identifier under `/publications/by-id`.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::PublicationId;
use crate::library::{CatalogSnapshot, Library, LibraryError, ScanReport};

/// Shared state for API handlers.
pub struct ApiState {
    /// The library. Scans and availability refreshes take the write lock,
    /// so at most one scan runs at a time.
    pub library: Arc<RwLock<Library>>,

    /// Ordinal mapping served to clients. Only replaced by [`ApiState::refresh`].
    pub snapshot: Arc<RwLock<CatalogSnapshot>>,
}

impl ApiState {
    /// Create API state with an empty snapshot.
    pub fn new(library: Library) -> Self {
        Self {
            library: Arc::new(RwLock::new(library)),
            snapshot: Arc::new(RwLock::new(CatalogSnapshot::default())),
        }
    }

    /// Rescan the library and fold the result into the snapshot.
    pub async fn refresh(&self) -> Result<ScanReport, LibraryError> {
        let mut library = self.library.write().await;
        let report = library.scan()?;

        let added = self.snapshot.write().await.absorb(&report);
        tracing::debug!(added = added, "Snapshot refreshed");

        Ok(report)
    }

    /// Publication identifier at `ordinal` in the current snapshot.
    pub async fn resolve(&self, ordinal: i64) -> Result<PublicationId, LibraryError> {
        self.snapshot.read().await.resolve(ordinal).cloned()
    }
}

/// Build the API router with all routes.
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status/health
        .route("/api/v1/status", get(handlers::status::health))
        // Library maintenance
        .route("/api/v1/library/scan", post(handlers::library::scan))
        // Publications
        .route(
            "/api/v1/publications",
            get(handlers::publications::list_publications),
        )
        .route(
            "/api/v1/publications/by-id/:id",
            get(handlers::publications::get_publication_by_id),
        )
        .route(
            "/api/v1/publications/:ordinal",
            get(handlers::publications::get_publication),
        )
        .route(
            "/api/v1/publications/:ordinal/thumbnail",
            get(handlers::publications::get_thumbnail),
        )
        .route(
            "/api/v1/publications/:ordinal/sync",
            post(handlers::publications::sync_publication),
        )
        // Installments
        .route(
            "/api/v1/publications/:ordinal/installments",
            get(handlers::installments::list_installments),
        )
        .route(
            "/api/v1/publications/:ordinal/installments/:installment",
            get(handlers::installments::get_installment),
        )
        .route(
            "/api/v1/publications/:ordinal/installments/:installment/pages",
            get(handlers::installments::list_pages),
        )
        .route(
            "/api/v1/publications/:ordinal/installments/:installment/pages/:page",
            get(handlers::installments::get_page),
        )
        // Categories
        .route(
            "/api/v1/categories",
            get(handlers::categories::list_categories)
                .post(handlers::categories::create_category),
        )
        .route(
            "/api/v1/categories/:category",
            get(handlers::categories::get_category).post(handlers::categories::add_to_category),
        )
        // Middleware
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                // Only log responses that are not successful
                .on_request(())
                .on_response(|response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                    let status = response.status();
                    if !status.is_success() {
                        tracing::warn!(
                            status = %status,
                            latency_ms = latency.as_millis(),
                            "request failed"
                        );
                    }
                })
        )
        .with_state(state)
}

/// Start the API server.
pub async fn serve(state: Arc<ApiState>, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    tracing::info!("Bindery API listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
