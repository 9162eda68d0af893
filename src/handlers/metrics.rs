use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::metrics;

pub async fn metrics_handler() -> Response {
    match metrics::render() {
        Ok(body) => body.into_response(),
        Err(e) => GatewayError::Internal(format!("metrics encoding failed: {}", e)).into_response(),
    }
}
