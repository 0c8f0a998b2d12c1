/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Failure of a single fetch cycle. Recorded into the feed state rather than
/// returned to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedError {
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed launch record: {0}")]
    MalformedRecord(String),

    #[error("No launches found for the selected filters")]
    EmptyResult,
}

impl FeedError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = match status {
            Some(code) => format!("Launch API returned {}: {}", code, message),
            None => format!("Launch API request failed: {}", message),
        };
        FeedError::Transport { status, message }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FeedError::Transport { .. } => "TRANSPORT_ERROR",
            FeedError::MalformedRecord(_) => "MALFORMED_RECORD",
            FeedError::EmptyResult => "EMPTY_RESULT",
        }
    }
}

pub type FeedResult<T> = Result<T, FeedError>;

/// Unified error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Database(sqlx::Error),
    ExternalApi(reqwest::Error),
    NotFound(String),
    Internal(String),
    InvalidInput(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Database(e) => write!(f, "Database error: {}", e),
            ApiError::ExternalApi(e) => write!(f, "External API error: {}", e),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::ExternalApi(err)
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::ExternalApi(_) => "UPSTREAM_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::NotFound(msg) | ApiError::Internal(msg) | ApiError::InvalidInput(msg) => {
                msg.clone()
            }
            other => other.to_string(),
        };

        let error_response = ErrorResponse {
            ok: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };

        // Always HTTP 200 with ok=false
        (StatusCode::OK, Json(error_response)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_carries_status() {
        let err = FeedError::transport(Some(429), "Too Many Requests");
        assert_eq!(err.to_string(), "Launch API returned 429: Too Many Requests");
        assert_eq!(err.code(), "TRANSPORT_ERROR");
    }

    #[test]
    fn transport_without_status() {
        let err = FeedError::transport(None, "connection refused");
        assert_eq!(
            err.to_string(),
            "Launch API request failed: connection refused"
        );
    }

    #[test]
    fn api_error_codes() {
        assert_eq!(ApiError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(ApiError::InvalidInput("x".into()).code(), "INVALID_INPUT");
    }
}
