use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::Method;
use reqwest::{Client, ClientBuilder, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::GatewayError;
use crate::metrics::{DOWNSTREAM_ERRORS, REQUEST_LATENCY};

// a fully formed downstream call
#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamRequest {
    pub method: Method,
    pub url: String,
    // API key included
    pub query: Vec<(String, String)>,
    // used when a failed downstream response carries no `message`
    pub fallback_message: String,
}

impl DownstreamRequest {
    pub fn get(url: impl Into<String>, fallback_message: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            fallback_message: fallback_message.into(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn to_url(&self) -> Result<Url, TransportError> {
        Url::parse_with_params(&self.url, &self.query)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", self.url, e)))
    }
}

#[derive(Debug, Clone)]
pub struct DownstreamResponse {
    pub status: u16,
    pub body: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid downstream url {0}")]
    InvalidUrl(String),

    #[error("downstream request timed out")]
    Timeout,

    #[error("downstream request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e)
        }
    }
}

// carries a request to the downstream and brings back the raw answer
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &DownstreamRequest) -> Result<DownstreamResponse, TransportError>;
}

// HTTP timeouts for the reqwest transport
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("weather-gateway/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(TransportError::Request)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &DownstreamRequest) -> Result<DownstreamResponse, TransportError> {
        let url = request.to_url()?;
        debug!(method = %request.method, url = %request.url, "Calling downstream");

        let response = self
            .client
            .request(request.method.clone(), url)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(DownstreamResponse { status, body })
    }
}

#[derive(Clone)]
pub struct Relay {
    transport: Arc<dyn Transport>,
}

impl Relay {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    // one downstream call, no retries
    pub async fn forward(&self, request: DownstreamRequest) -> Result<Value, GatewayError> {
        let start = Instant::now();
        let result = self.transport.execute(&request).await;
        REQUEST_LATENCY.observe(start.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                DOWNSTREAM_ERRORS.inc();
                return Err(GatewayError::Transport(e.to_string()));
            }
        };

        if !(200..300).contains(&response.status) {
            DOWNSTREAM_ERRORS.inc();
            return Err(GatewayError::Downstream {
                status: response.status,
                message: error_message(&response.body)
                    .unwrap_or(request.fallback_message),
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            DOWNSTREAM_ERRORS.inc();
            GatewayError::Transport(format!("unreadable downstream body: {}", e))
        })
    }
}

// Pull `message` out of a downstream error payload, if there is one
fn error_message(body: &[u8]) -> Option<String> {
    let payload: Value = serde_json::from_slice(body).ok()?;
    match payload.get("message")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        other => Some(other.to_string()),
    }
}
