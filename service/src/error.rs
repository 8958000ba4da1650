use crate::registry::RegistryError;
use crate::render::RenderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use logwatch_parser::{AggregateError, ParseError};
use serde_json::json;

/// Everything a handler can fail with, mapped to a status code and an
/// `{"error": ...}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error("Registry error: {0}")]
    Persistence(#[from] RegistryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Aggregate(AggregateError::NoData) => StatusCode::NOT_FOUND,
            ApiError::Parse(_)
            | ApiError::Persistence(_)
            | ApiError::Render(_)
            | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
