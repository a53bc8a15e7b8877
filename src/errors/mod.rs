/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Error body returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{context}: {details}")]
    Upstream {
        context: &'static str,
        details: String,
    },
    #[error("{context}: timeout of {timeout_ms}ms exceeded")]
    UpstreamTimeout {
        context: &'static str,
        timeout_ms: u64,
    },
    #[error("Endpoint not found")]
    NotFound,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream { .. }
            | ApiError::UpstreamTimeout { .. }
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body sent to the caller. Internal faults stay generic.
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            ApiError::InvalidInput(msg) | ApiError::Forbidden(msg) => ErrorEnvelope::new(msg.clone()),
            ApiError::Upstream { context, details } => {
                ErrorEnvelope::with_details(*context, details.clone())
            }
            ApiError::UpstreamTimeout {
                context,
                timeout_ms,
            } => ErrorEnvelope::with_details(
                *context,
                format!("timeout of {}ms exceeded", timeout_ms),
            ),
            ApiError::NotFound => ErrorEnvelope::new("Endpoint not found"),
            ApiError::RateLimited => ErrorEnvelope::new(RATE_LIMIT_MESSAGE),
            ApiError::Internal(_) => ErrorEnvelope::new("Internal server error"),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(msg) = &self {
            error!("Unhandled error: {}", msg);
        }

        let status = self.status();
        match self {
            // Rate limiting answers in plain text
            ApiError::RateLimited => (status, RATE_LIMIT_MESSAGE).into_response(),
            other => (status, Json(other.envelope())).into_response(),
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
