#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod config;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::state::AppState;

pub fn app(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .nest("/api", api::router())
        .layer(DefaultBodyLimit::max(config.max_body))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> String {
    format!("GeoExtract {}", env!("CARGO_PKG_VERSION"))
}
