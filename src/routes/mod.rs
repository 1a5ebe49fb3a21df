//! Router HTTP
//!
//! Ensambla los routers de cada recurso y las capas comunes.

pub mod preferences_routes;
pub mod route_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::json;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::cors::cors_layer;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/routes", route_routes::create_route_router())
        .nest("/api/technicians", route_routes::create_technician_router())
        .nest("/api/preferences", preferences_routes::create_preferences_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Health check simple
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "pool_routes",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
