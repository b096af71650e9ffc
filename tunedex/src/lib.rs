//! tunedex library - media catalog indexer and query service
//!
//! Scans a directory tree into a SQLite catalog keyed by content hash, then serves the
//! catalog as JSON and the files themselves over HTTP.

use axum::Router;
use std::path::Path;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use db::Catalog;
pub use error::{ApiError, ApiResult};
pub use services::AttributeResolver;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub resolver: AttributeResolver,
}

impl AppState {
    /// Create new application state
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            resolver: AttributeResolver::new(),
        }
    }
}

/// Build application router
///
/// Files under `music_dir` are served below `static_prefix`, the same prefix the ingest
/// pass wrote into each record's public path.
pub fn build_router(state: AppState, music_dir: &Path, static_prefix: &str) -> Router {
    let files = ServeDir::new(music_dir);
    let mount = static_prefix.trim_matches('/');

    let router = Router::new()
        .merge(api::song_routes())
        .merge(api::health_routes());

    let router = if mount.is_empty() {
        router.fallback_service(files)
    } else {
        router.nest_service(&format!("/{}", mount), files)
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
