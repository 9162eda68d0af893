use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::relay::HttpConfig;

pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org/data/2.5";

// CLI argument structure, every flag also readable from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "weather-gateway")]
#[command(about = "Rate limited proxy for the OpenWeather API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    // OpenWeather API key
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    // Base URL of the weather API
    #[arg(long, env = "WEATHER_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    // Max requests per client per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 60,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub rate_window: u64,

    // Whole downstream request timeout in seconds
    #[arg(long, env = "DOWNSTREAM_TIMEOUT", default_value_t = 30,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub downstream_timeout: u64,

    // Downstream connect timeout in seconds
    #[arg(long, env = "CONNECT_TIMEOUT", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub connect_timeout: u64,

    // Reported by /health
    #[arg(long, env = "APP_ENV", default_value = "development")]
    pub environment: String,

    // Directory with the browser client, served for unmatched paths
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    // Take the client address from X-Forwarded-For
    #[arg(long, env = "TRUST_PROXY")]
    pub trust_proxy: bool,
}

impl Args {
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout),
            request_timeout: Duration::from_secs(self.downstream_timeout),
            ..HttpConfig::default()
        }
    }

    // Empty strings from the environment count as unset
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}
