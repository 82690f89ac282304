//! Rutas HTTP
//!
//! Cada submódulo arma su `Router<AppState>`; `create_router` los monta
//! bajo `/api`.

pub mod fleet_routes;
pub mod loyalty_routes;
pub mod shift_routes;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/fleet", fleet_routes::create_fleet_router())
        .nest("/api/loyalty", loyalty_routes::create_loyalty_router())
        .nest("/api/points", loyalty_routes::create_points_router())
        .nest("/api/shifts", shift_routes::create_shift_router())
}

/// Endpoint de salud
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
