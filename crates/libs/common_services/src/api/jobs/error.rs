use crate::session_store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use color_eyre::eyre;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum JobsError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job ID already exists")]
    AlreadyExists(String),

    #[error("Job ID must not be empty")]
    EmptyJobId,

    #[error("session store failure")]
    Store(StoreError),

    #[error("internal error")]
    Internal(#[from] eyre::Report),
}

impl From<StoreError> for JobsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(job_id) => Self::NotFound(job_id),
            StoreError::AlreadyExists(job_id) => Self::AlreadyExists(job_id),
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for JobsError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::NotFound(job_id) => {
                (StatusCode::NOT_FOUND, format!("Job not found: {job_id}"))
            }
            Self::AlreadyExists(_) | Self::EmptyJobId => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::Store(ref inner) => {
                error!(error = %inner, "session store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A storage error occurred.".to_string(),
                )
            }
            Self::Internal(ref report) => {
                error!(error = %report, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected internal error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
