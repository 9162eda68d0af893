use crate::models::Units;
use crate::relay::DownstreamRequest;

const WEATHER_FALLBACK: &str = "Failed to fetch weather data";
const FORECAST_FALLBACK: &str = "Failed to fetch forecast data";

// Builds OpenWeather requests with the API key merged in
#[derive(Debug, Clone)]
pub struct WeatherApi {
    base_url: String,
    api_key: Option<String>,
}

impl WeatherApi {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn current(&self, city: &str, units: Units) -> DownstreamRequest {
        self.request("weather", WEATHER_FALLBACK)
            .param("q", city)
            .param("units", units.as_str())
            .param("appid", self.key())
    }

    pub fn forecast(&self, city: &str, units: Units) -> DownstreamRequest {
        self.request("forecast", FORECAST_FALLBACK)
            .param("q", city)
            .param("units", units.as_str())
            .param("appid", self.key())
    }

    pub fn coordinates(&self, lat: f64, lon: f64, units: Units) -> DownstreamRequest {
        self.request("weather", WEATHER_FALLBACK)
            .param("lat", lat.to_string())
            .param("lon", lon.to_string())
            .param("units", units.as_str())
            .param("appid", self.key())
    }

    fn request(&self, endpoint: &str, fallback: &str) -> DownstreamRequest {
        DownstreamRequest::get(format!("{}/{}", self.base_url, endpoint), fallback)
    }

    // a missing key is still sent so the downstream answers 401 itself
    fn key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }
}
