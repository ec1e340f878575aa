use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoloError {
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Multipart error: {0}")]
    Multipart(String),

    #[error("Image processing error: {0}")]
    Processing(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("API rate limit exceeded, retry after {retry_after:?} seconds")]
    ApiRateLimit { retry_after: Option<u64> },

    #[error("API authentication error: {0}")]
    ApiAuth(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("Enrichment unavailable: {0}")]
    EnrichmentUnavailable(String),
}

impl IntoResponse for RoloError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RoloError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            RoloError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RoloError::Multipart(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RoloError::Database(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            RoloError::Processing(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RoloError::Http(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            RoloError::Json(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            RoloError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            RoloError::UrlParse(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            RoloError::ApiRateLimit { .. } => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            RoloError::ApiAuth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            RoloError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            RoloError::Ocr(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            RoloError::OcrUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            RoloError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            RoloError::StorageUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            RoloError::Enrichment(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            RoloError::EnrichmentUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RoloError>;
