use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid JSON")]
    InvalidRequest,

    #[error("Missing 'status' field")]
    MissingField,

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidRequest | ApiError::MissingField => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<GpioError> for ApiError {
    fn from(err: GpioError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    #[error("GPIO error: {0}")]
    Hardware(#[from] rppal::gpio::Error),

    #[error("Board pin {0} is not a GPIO line")]
    NotGpio(u8),

    #[error("GPIO pin {0} has been released")]
    Released(u8),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value {value:?} for {key}")]
    InvalidOverride { key: &'static str, value: String },

    #[error("auth.force requires a non-empty username and password")]
    InvalidAuth,

    #[error("tunnel.startup_timeout_secs must be at least 1")]
    InvalidTimeout,
}

#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    #[error("Failed to launch {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install tunnel auth token: {0}")]
    AuthToken(String),

    #[error("Tunnel client error: {0}")]
    Client(String),

    #[error("Tunnel client exited before reporting a public URL")]
    Exited,

    #[error("Failed to read tunnel client output: {0}")]
    Io(#[source] std::io::Error),

    #[error("No public URL after {0}s")]
    Timeout(u64),
}
