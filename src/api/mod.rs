//! API module for handling HTTP requests and responses

#[cfg(feature = "web")]
pub mod handlers;
#[cfg(feature = "web")]
pub mod responses;

#[cfg(feature = "web")]
use axum::{
    routing::{get, post},
    Router,
};
#[cfg(feature = "web")]
use std::sync::Arc;
#[cfg(feature = "web")]
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
#[cfg(feature = "web")]
use crate::state::AppState;

#[cfg(feature = "web")]
pub use handlers::health_check;
#[cfg(feature = "web")]
use handlers::{export_png, list_logos, serve_logo, similar_logos};

#[cfg(feature = "web")]
/// Create the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/logos", get(list_logos))
        .route("/api/similar/*logo_path", get(similar_logos))
        .route("/api/export_png", post(export_png))
        .route("/logos/*path", get(serve_logo))
        // Front end
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
