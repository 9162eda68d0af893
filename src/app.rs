use axum::{
    Json, Router,
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::INTERNAL_MESSAGE;
use crate::handlers::{
    coordinates_handler, current_handler, forecast_handler, health_handler, metrics_handler,
    not_found_handler,
};
use crate::models::ErrorBody;
use crate::state::AppState;

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_handler).fallback(not_found_handler))
        .route("/weather/current", get(current_handler).fallback(not_found_handler))
        .route("/weather/forecast", get(forecast_handler).fallback(not_found_handler))
        .route(
            "/weather/coordinates",
            get(coordinates_handler).fallback(not_found_handler),
        )
}

// Build the full router. Every API route also answers under /api.
// Known paths hit with another method get the same 404 as unknown paths.
pub fn router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let app = Router::new()
        .merge(api_routes())
        .nest("/api", api_routes())
        .route("/metrics", get(metrics_handler).fallback(not_found_handler))
        .with_state(state);

    let app = match static_dir {
        Some(dir) => app.fallback_service(
            ServeDir::new(dir)
                .call_fallback_on_method_not_allowed(true)
                .not_found_service(not_found_handler.into_service()),
        ),
        None => app.fallback(not_found_handler),
    };

    apply_layers(app)
}

// Panic catching, CORS and request tracing around any router
pub fn apply_layers(app: Router) -> Router {
    app.layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// Log the panic payload, answer with the generic body
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(detail = %detail, "Handler panicked");

    let body = ErrorBody {
        error: INTERNAL_MESSAGE.to_string(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
