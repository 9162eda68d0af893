mod health;
mod metrics;
mod weather;

pub use health::{health_handler, not_found_handler};
pub use metrics::metrics_handler;
pub use weather::{coordinates_handler, current_handler, forecast_handler};
