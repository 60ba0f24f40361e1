//! Error types for the server

use crate::error::TunerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Server busy: {0}")]
    Busy(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Tuner(#[from] TunerError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Busy(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
            ServerError::Tuner(e) if e.is_config_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            ServerError::Tuner(e @ (TunerError::DataError(_) | TunerError::FeatureNotFound(_) | TunerError::IoError(_))) => {
                tracing::error!(detail = %e, "Dataset error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Dataset could not be loaded. Check server logs for details.".to_string(),
                )
            }
            ServerError::Tuner(e) => {
                tracing::error!(detail = %e, "Search failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Search failed. Check server logs for details.".to_string())
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let status = |e: ServerError| e.into_response().status();

        assert_eq!(status(ServerError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(ServerError::Busy("x".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status(TunerError::InvalidConfig("pop_size".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(TunerError::DataError("missing".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
