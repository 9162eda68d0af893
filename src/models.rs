use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

// Query string for /weather/current and /weather/forecast
#[derive(Deserialize, Debug, Default)]
pub struct CityQuery {
    pub city: Option<String>,
    pub units: Option<String>,
}

// Query string for /weather/coordinates
#[derive(Deserialize, Debug, Default)]
pub struct CoordinatesQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub units: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    // Missing or blank means metric
    pub fn parse(raw: Option<&str>) -> Result<Self, GatewayError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Units::Metric),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "metric" => Ok(Units::Metric),
                "imperial" => Ok(Units::Imperial),
                "standard" => Ok(Units::Standard),
                _ => Err(GatewayError::BadRequest(
                    "Units must be one of metric, imperial or standard".to_string(),
                )),
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }
}

impl CityQuery {
    pub fn validate(&self) -> Result<(String, Units), GatewayError> {
        let city = non_empty(self.city.as_deref())
            .ok_or_else(|| GatewayError::BadRequest("City parameter is required".to_string()))?;
        let units = Units::parse(self.units.as_deref())?;
        Ok((city.to_string(), units))
    }
}

impl CoordinatesQuery {
    pub fn validate(&self) -> Result<(f64, f64, Units), GatewayError> {
        let (lat, lon) = match (non_empty(self.lat.as_deref()), non_empty(self.lon.as_deref())) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(GatewayError::BadRequest(
                    "Latitude and longitude parameters are required".to_string(),
                ));
            }
        };

        let invalid =
            || GatewayError::BadRequest("Latitude and longitude must be numbers".to_string());
        let lat: f64 = lat.parse().map_err(|_| invalid())?;
        let lon: f64 = lon.parse().map_err(|_| invalid())?;
        if !lat.is_finite() || !lon.is_finite() {
            return Err(invalid());
        }

        let units = Units::parse(self.units.as_deref())?;
        Ok((lat, lon, units))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// Body of every error response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub environment: String,
}
