use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// Uniform wrapper returned by every `/api` handler.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    pub status: EnvelopeStatus,
    pub data: Option<Value>,
}

impl Envelope {
    pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Self {
        // plain structs and maps never fail to serialize
        let data = serde_json::to_value(data).ok();
        Self {
            success: true,
            message: message.into(),
            status: EnvelopeStatus::Success,
            data,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            status: EnvelopeStatus::Error,
            data: None,
        }
    }
}

pub type ApiResult = Result<Json<Envelope>, AppError>;

/// Failures that leave the envelope in-band and escape as a transport error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Repo(#[from] crate::users::repo::RepoError),
}

pub const INTERNAL_MESSAGE: &str = "Internal server error";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        internal_error_response()
    }
}

pub fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::fail(INTERNAL_MESSAGE)),
    )
        .into_response()
}
