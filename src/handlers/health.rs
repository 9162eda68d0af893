use axum::{Json, extract::State};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::models::HealthResponse;
use crate::state::AppState;

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        environment: state.environment.clone(),
    })
}

// fallback for every unmatched route
pub async fn not_found_handler() -> GatewayError {
    GatewayError::NotFound
}
