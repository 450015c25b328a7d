//! Fund API - Read-only HTTP access to imported funds
//!
//! Endpoints:
//! - GET /      - Liveness check
//! - GET /funds - List every stored fund

pub mod config;
pub mod store;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::store::FundReader;

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub funds: Arc<dyn FundReader>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Handlers
// ============================================================================

async fn root_handler() -> &'static str {
    "Server is running"
}

async fn funds_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.funds.list_all().await {
        Ok(funds) => Json(funds).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch funds");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch funds".to_string(),
                }),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/funds", get(funds_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
