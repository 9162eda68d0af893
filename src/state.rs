use std::sync::Arc;

use crate::rate_limit::AdmissionGateway;
use crate::relay::Relay;
use crate::weather::WeatherApi;

// app's shared state

pub struct AppState {
    pub gateway: Arc<AdmissionGateway>, // shared with the sweeper
    pub relay: Relay,
    pub weather: WeatherApi,
    pub environment: String, // reported by /health
    pub trust_proxy: bool,   // read client address from X-Forwarded-For
}
