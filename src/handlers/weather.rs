use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::error::{GatewayError, Result};
use crate::identity::ClientIdentity;
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_TOTAL};
use crate::models::{CityQuery, CoordinatesQuery};
use crate::relay::DownstreamRequest;
use crate::state::AppState;

// malformed query strings get the same JSON error body as missing parameters
fn query_or_bad_request<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(q)| q)
        .map_err(|e| GatewayError::BadRequest(e.body_text()))
}

// Admission check, then the downstream call
async fn admit_and_forward(
    state: &AppState,
    identity: &ClientIdentity,
    request: DownstreamRequest,
) -> Result<Json<Value>> {
    if !state.gateway.check(identity.as_str()).is_allowed() {
        RATE_LIMITED_TOTAL.inc();
        info!(client = identity.as_str(), "Rate limit exceeded");
        return Err(GatewayError::RateLimited);
    }

    state.relay.forward(request).await.map(Json)
}

pub async fn current_handler(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    query: std::result::Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    REQUEST_TOTAL.inc();

    let (city, units) = query_or_bad_request(query)?.validate()?;
    let request = state.weather.current(&city, units);

    admit_and_forward(&state, &identity, request).await
}

pub async fn forecast_handler(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    query: std::result::Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    REQUEST_TOTAL.inc();

    let (city, units) = query_or_bad_request(query)?.validate()?;
    let request = state.weather.forecast(&city, units);

    admit_and_forward(&state, &identity, request).await
}

pub async fn coordinates_handler(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    query: std::result::Result<Query<CoordinatesQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    REQUEST_TOTAL.inc();

    let (lat, lon, units) = query_or_bad_request(query)?.validate()?;
    let request = state.weather.coordinates(lat, lon, units);

    admit_and_forward(&state, &identity, request).await
}
