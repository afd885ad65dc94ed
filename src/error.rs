use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::ConfigError;
use crate::types::ErrorResponse;
use dockerlab_probe::ProbeError;

pub const ROUTE_NOT_FOUND: &str = "Route not found";
pub const INTERNAL_FAULT: &str = "Something went wrong!";

pub type Result<T> = std::result::Result<T, DockerlabError>;

#[derive(Debug, Error)]
pub enum DockerlabError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("route not found: {path}")]
    NotFound { path: String },
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProbeError> for ApiError {
    fn from(err: ProbeError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::NotFound { path } => ErrorResponse {
                error: ROUTE_NOT_FOUND.to_owned(),
                path: Some(path),
                message: None,
            },
            ApiError::Internal(message) => {
                tracing::error!(%message, "request failed");
                ErrorResponse {
                    error: INTERNAL_FAULT.to_owned(),
                    path: None,
                    message: Some(message),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
