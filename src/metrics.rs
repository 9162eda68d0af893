use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("weather_requests_total", "Total number of weather requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter = register_counter!(
        "weather_rate_limited_total",
        "Requests rejected by the admission gateway"
    )
    .unwrap();
    pub static ref DOWNSTREAM_ERRORS: Counter = register_counter!(
        "weather_downstream_errors_total",
        "Downstream calls that failed or returned a non-success status"
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "weather_request_latency_seconds",
        "Downstream round trip latency in seconds"
    )
    .unwrap();
    pub static ref TRACKED_CLIENTS: Gauge = register_gauge!(
        "weather_tracked_clients",
        "Client windows currently held by the admission gateway"
    )
    .unwrap();
}

// Render the default registry in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
