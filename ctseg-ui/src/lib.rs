//! ctseg-ui library - catalog browsing and run comparison service
//!
//! Serves the single-page UI and the JSON/PNG API it talks to. The
//! currently loaded comparison (three in-memory volumes) lives in
//! [`AppState`] so the slice endpoint can serve any index the slider
//! asks for.

use axum::Router;
use ctseg_common::CtVolume;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod api;
pub mod c3d;
pub mod error;
pub mod render;

use c3d::C3dClient;

/// The three volumes of an executed comparison, kept in memory for
/// slice browsing.
pub struct LoadedComparison {
    pub label: String,
    pub challenge_1: i64,
    pub challenge_2: i64,
    pub base: CtVolume,
    pub mask_1: CtVolume,
    pub mask_2: CtVolume,
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Catalog database pool
    pub db: SqlitePool,
    /// Root folder the catalog's relative paths resolve against
    pub data_root: PathBuf,
    /// External c3d binary client
    pub c3d: Arc<C3dClient>,
    /// Most recently executed comparison, if any
    pub current: Arc<RwLock<Option<Arc<LoadedComparison>>>>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, data_root: PathBuf, c3d: C3dClient) -> Self {
        Self {
            db,
            data_root,
            c3d: Arc::new(c3d),
            current: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/api/collections", get(api::collection_tree))
        .route("/api/base-images/:label/runs", get(api::runs_for_base_image))
        .route("/api/compare", post(api::run_comparison))
        .route("/api/slice/:index", get(api::get_slice))
        .route("/api/comparisons", get(api::recent_comparison_history))
        .merge(api::health_routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
