//! HTTP surface.
//!
//! The router is built from an [`AppState`] so tests can drive it in-process;
//! [`serve`] binds the configured address and runs it until Ctrl-C.

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiJson};
pub use state::AppState;

use crate::catalog::CatalogError;
use crate::config::ServiceConfig;
use crate::proxy::ProxyError;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use handlers::{health, photo_records, photographers, print_history, proxy, uploads};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("cannot listen on {bind}: {source}")]
    Bind {
        bind: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.photo.max_request_bytes();
    let uploads = ServeDir::new(&state.config.storage.uploads_root);
    let public_prefix = state.config.storage.public_prefix.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health::index))
        .route("/api/save-photographers", post(photographers::save_photographers))
        .route("/api/photographers", get(photographers::list_photographers))
        .route("/api/status", get(photographers::status))
        .route("/api/download-csv", get(photographers::download_csv))
        .route(
            "/api/photographers/download-csv",
            get(photographers::download_details_csv),
        )
        .route("/api/clear-all-data", post(photographers::clear_all_data))
        .route("/api/save-photo-records", post(photo_records::save_photo_records))
        .route("/api/photo-records", get(photo_records::list_photo_records))
        .route(
            "/api/photo-records/download-csv",
            get(photo_records::download_csv),
        )
        .route("/api/photos/{photographer_name}", get(photo_records::photos_by_owner))
        .route("/api/upload-photos", post(uploads::upload_photos))
        .route(
            "/api/uploaded-photos/{photographer_name}",
            get(uploads::uploaded_photos),
        )
        .route("/api/print-certificate", post(print_history::print_certificate))
        .route("/api/print-history", get(print_history::full_history))
        .route(
            "/api/print-history/{photographer_id}",
            get(print_history::history_for),
        )
        .route("/api/extract-image-url", post(proxy::extract_image_url))
        .route("/api/image-proxy", get(proxy::image_proxy))
        .nest_service(&public_prefix, uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the collections, bind, and serve until Ctrl-C.
pub async fn serve(config: ServiceConfig) -> Result<(), ServeError> {
    let bind = config.server.bind.clone();
    let state = AppState::new(config)?;
    state.catalogs.ensure_all()?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|source| ServeError::Bind {
            bind: bind.clone(),
            source,
        })?;

    tracing::info!(
        bind = %bind,
        public_url = %state.config.server.public_url,
        uploads = %state.config.storage.uploads_root.display(),
        data = %state.config.storage.data_dir.display(),
        standard = %state.config.photo.tag(),
        "photo-intake listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
