pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::infrastructure::storage::FileStore;
use crate::services::upload::UploadService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, StatusCode, header},
    routing::get,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<FileStore>,
    pub uploads: Arc<UploadService>,
}

pub fn create_app(state: AppState) -> Router {
    let max_body = state.config.max_file_size;

    Router::new()
        .route(
            "/",
            get(api::handlers::uploads::list_files)
                .post(api::handlers::uploads::upload_file)
                .options(api::handlers::uploads::preflight),
        )
        .route(
            "/:file",
            get(api::handlers::files::download_file).options(api::handlers::files::preflight),
        )
        .fallback(not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION]),
        )
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
