use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ErrorBody;

pub const TRANSPORT_MESSAGE: &str = "internal error";
pub const INTERNAL_MESSAGE: &str = "Something went wrong!";

// every failure a request can end in, one status code per variant
#[derive(Error, Debug)]
pub enum GatewayError {
    // missing or invalid query parameters
    #[error("{0}")]
    BadRequest(String),

    #[error("Too many requests. Please try again later.")]
    RateLimited,

    // downstream answered with a non-success status
    #[error("{message}")]
    Downstream { status: u16, message: String },

    // downstream unreachable or its body unreadable
    #[error("{}", TRANSPORT_MESSAGE)]
    Transport(String),

    #[error("Endpoint not found")]
    NotFound,

    // detail is only logged
    #[error("{}", INTERNAL_MESSAGE)]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Downstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::Transport(_) => StatusCode::BAD_GATEWAY,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::Transport(detail) => {
                error!(detail = %detail, "Downstream transport failure");
            }
            GatewayError::Internal(detail) => {
                error!(detail = %detail, "Unhandled error");
            }
            GatewayError::Downstream { status, message } => {
                warn!(status, message = %message, "Downstream returned an error");
            }
            _ => {}
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
