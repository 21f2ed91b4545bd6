//! Leibniz web server
//!
//! Thin axum layer over [`TermService`]:
//!
//! - `GET /terms` - every memoized term, ascending by index
//! - `GET /terms/{index}` - one term, computed on first request
//! - `GET /pi` - the accumulated approximation and its contributing indexes

pub mod handlers;
pub mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use leibniz_config::Config;
use leibniz_service::TermService;
use leibniz_store::{FilePiStore, FileTermStore};
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState {
    pub service: TermService,
}

impl AppState {
    pub fn new(service: TermService) -> Self {
        Self { service }
    }

    /// Open the stores named by `config` and fold in any terms a previous
    /// run saved but never accumulated.
    pub async fn load(config: &Config) -> anyhow::Result<Self> {
        let service = if config.in_memory {
            tracing::warn!("using in-memory stores; nothing will be persisted");
            TermService::in_memory()
        } else {
            let terms = FileTermStore::open(config.terms_path()).await?;
            let pi = FilePiStore::open(config.pi_path()).await?;
            tracing::info!(data_dir = %config.data_dir.display(), "stores loaded");
            TermService::new(Arc::new(terms), Arc::new(pi))
        };

        service.reconcile().await?;
        Ok(Self::new(service))
    }
}

/// Create the main router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/terms", get(handlers::list_terms))
        .route("/terms/{index}", get(handlers::get_term))
        .route("/pi", get(handlers::get_pi))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server and run until ctrl-c.
pub async fn serve(state: Arc<AppState>, addr: &str) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Leibniz server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
