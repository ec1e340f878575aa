//! # V1 API Response Envelope & Error Contract
//!
//! Defines the canonical wire format for all v1 API responses. Every endpoint
//! returns an [`ApiResponse<T>`] envelope:
//!
//! ```json
//! {
//!   "success": true,
//!   "data": { ... },                                    // present on success
//!   "error": { "code": "not_found", "message": "..." }, // present on failure
//!   "message": "Card created",                          // optional summary
//!   "timestamp": "2026-08-08T12:00:00Z",
//!   "requestId": "550e8400-e29b-41d4-a716-446655440000"
//! }
//! ```
//!
//! ## ID Formats
//!
//! - **cardId / jobId / companyId**: nanoid, 21 characters
//! - **requestId**: UUID v4, generated per response

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RoloError;

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
/// Each variant maps to a fixed HTTP status code via [`ErrorCode::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request was malformed, had invalid parameters, or failed validation.
    /// HTTP 400.
    InvalidRequest,
    /// Authentication is required or the provided credentials are invalid.
    /// HTTP 401.
    Unauthorized,
    /// The authenticated caller may not perform this operation. HTTP 403.
    Forbidden,
    /// The requested resource does not exist. HTTP 404.
    NotFound,
    /// The request was well-formed but could not be processed, e.g. OCR
    /// failed on the uploaded image. HTTP 422.
    Unprocessable,
    /// The caller exceeded a rate limit. HTTP 429.
    TooManyRequests,
    /// An unexpected server-side error occurred. Internal details are never
    /// leaked to the client. HTTP 500.
    InternalError,
    /// The requested subsystem is not configured on this deployment. HTTP 501.
    NotImplemented,
}

impl ErrorCode {
    /// Returns the HTTP status code corresponding to this error code.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::NotFound => write!(f, "not_found"),
            Self::Unprocessable => write!(f, "unprocessable"),
            Self::TooManyRequests => write!(f, "too_many_requests"),
            Self::InternalError => write!(f, "internal_error"),
            Self::NotImplemented => write!(f, "not_implemented"),
        }
    }
}

/// Structured error payload within the API envelope.
///
/// ```json
/// { "code": "not_found", "message": "Card abc123 not found" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    /// Machine-readable error classification.
    pub code: ErrorCode,
    /// Human-readable description safe to display to end users.
    /// Internal implementation details are never included.
    pub message: String,
}

/// Canonical v1 API response envelope.
///
/// Every v1 endpoint returns this shape. On success, `success` is `true` and
/// `data` is present. On error, `success` is `false` and `error` is present.
/// The HTTP status code is derived from the error code (on error) or from
/// the explicit status set via constructors like [`ApiResponse::created`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    /// The response payload. Present on success, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error details. Present on error, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    /// Optional human-readable summary of the outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Server-side time the response was produced.
    pub timestamp: DateTime<Utc>,
    /// Unique ID for correlating this response with server logs.
    pub request_id: String,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    fn base(status: StatusCode) -> Self {
        Self {
            success: status.is_success(),
            data: None,
            error: None,
            message: None,
            timestamp: Utc::now(),
            request_id: Uuid::new_v4().to_string(),
            status,
        }
    }

    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::base(StatusCode::OK)
        }
    }

    /// Resource created response (HTTP 201).
    pub fn created(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::base(StatusCode::CREATED)
        }
    }

    /// Accepted for processing response (HTTP 202).
    ///
    /// Used when the server has accepted the request but processing is not
    /// yet complete (e.g. an OCR job was queued).
    pub fn accepted(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::base(StatusCode::ACCEPTED)
        }
    }

    /// Attach a human-readable summary to the envelope.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        let message = message.into();
        Self {
            error: Some(ApiError {
                code,
                message: message.clone(),
            }),
            message: Some(message),
            ..Self::base(status)
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let fallback = ApiResponse::<()>::error(
                    ErrorCode::InternalError,
                    "An internal error occurred",
                );
                let body = serde_json::json!({
                    "success": false,
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    },
                    "timestamp": fallback.timestamp,
                    "requestId": fallback.request_id,
                });
                (fallback.status, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<RoloError> for ApiResponse<T> {
    /// Convert a [`RoloError`] into a v1 [`ApiResponse`].
    ///
    /// Internal error details are **never** leaked to the client. For
    /// `internal_error` responses, a generic message is returned and the
    /// real error is logged via `tracing::error!`.
    fn from(err: RoloError) -> Self {
        match err {
            RoloError::NotFound(ref msg) => ApiResponse::error(ErrorCode::NotFound, msg.clone()),

            RoloError::Validation(ref msg) => {
                ApiResponse::error(ErrorCode::InvalidRequest, msg.clone())
            }

            RoloError::Multipart(ref msg) => {
                ApiResponse::error(ErrorCode::InvalidRequest, msg.clone())
            }

            RoloError::Processing(ref msg) => {
                ApiResponse::error(ErrorCode::InvalidRequest, msg.clone())
            }

            RoloError::Json(ref e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"))
            }

            RoloError::UrlParse(ref e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid URL: {e}"))
            }

            RoloError::ApiAuth(_) => {
                ApiResponse::error(ErrorCode::Unauthorized, "Authentication required")
            }

            RoloError::ApiRateLimit { retry_after } => {
                let msg = match retry_after {
                    Some(secs) => format!("Rate limit exceeded, retry after {secs} seconds"),
                    None => "Rate limit exceeded".to_string(),
                };
                ApiResponse::error(ErrorCode::TooManyRequests, msg)
            }

            // OCR failures on an otherwise valid upload are unprocessable
            // rather than internal: the client sent a readable request with
            // an unreadable image.
            RoloError::Ocr(ref msg) => ApiResponse::error(ErrorCode::Unprocessable, msg.clone()),

            RoloError::OcrUnavailable(ref msg) => {
                ApiResponse::error(ErrorCode::NotImplemented, msg.clone())
            }

            RoloError::StorageUnavailable(ref msg) => {
                ApiResponse::error(ErrorCode::NotImplemented, msg.clone())
            }

            RoloError::EnrichmentUnavailable(ref msg) => {
                ApiResponse::error(ErrorCode::NotImplemented, msg.clone())
            }

            ref internal @ (RoloError::Database(_)
            | RoloError::Http(_)
            | RoloError::Io(_)
            | RoloError::Internal(_)
            | RoloError::Storage(_)
            | RoloError::Enrichment(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let resp = ApiResponse::success("hello");
        let json = serde_json::to_value(&resp).expect("serialize");

        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "hello");
        assert!(json.get("error").is_none());
        assert!(json["timestamp"].is_string());
        assert!(json["requestId"].is_string());
    }

    #[test]
    fn error_envelope_shape() {
        let resp = ApiResponse::<()>::error(ErrorCode::NotFound, "gone");
        let json = serde_json::to_value(&resp).expect("serialize");

        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "not_found");
        assert_eq!(json["error"]["message"], "gone");
        assert_eq!(json["message"], "gone");
    }

    #[test]
    fn request_ids_are_unique() {
        let a = ApiResponse::success(1);
        let b = ApiResponse::success(1);
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn with_message_attaches_summary() {
        let resp = ApiResponse::success("x").with_message("Card created");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["message"], "Card created");
    }

    #[test]
    fn error_code_status_mapping() {
        assert_eq!(ErrorCode::InvalidRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::Unprocessable.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::TooManyRequests.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ErrorCode::InternalError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::NotImplemented.status(),
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn error_code_serializes_snake_case() {
        let json = serde_json::to_value(&ErrorCode::TooManyRequests).expect("serialize");
        assert_eq!(json, "too_many_requests");

        let json = serde_json::to_value(&ErrorCode::Unprocessable).expect("serialize");
        assert_eq!(json, "unprocessable");
    }

    #[test]
    fn created_response_has_201_status() {
        let resp = ApiResponse::created("new-resource");
        assert_eq!(resp.status, StatusCode::CREATED);
        assert!(resp.success);
    }

    #[test]
    fn accepted_response_has_202_status() {
        let resp = ApiResponse::accepted("queued");
        assert_eq!(resp.status, StatusCode::ACCEPTED);
        assert!(resp.success);
    }

    #[test]
    fn rolo_error_not_found_maps_correctly() {
        let resp: ApiResponse<()> = RoloError::NotFound("gone".into()).into();
        assert_eq!(
            resp.error.as_ref().expect("error").code,
            ErrorCode::NotFound
        );
    }

    #[test]
    fn rolo_error_ocr_maps_to_unprocessable() {
        let resp: ApiResponse<()> = RoloError::Ocr("unreadable image".into()).into();
        assert_eq!(
            resp.error.as_ref().expect("error").code,
            ErrorCode::Unprocessable
        );
    }

    #[test]
    fn rolo_error_internal_does_not_leak() {
        let resp: ApiResponse<()> = RoloError::Internal("secret debug info".into()).into();
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "An internal error occurred");
    }

    #[test]
    fn rolo_error_unavailable_maps_to_not_implemented() {
        let resp: ApiResponse<()> = RoloError::OcrUnavailable("no OCR".into()).into();
        assert_eq!(
            resp.error.as_ref().expect("error").code,
            ErrorCode::NotImplemented
        );
    }

    #[test]
    fn rolo_error_rate_limit_maps_to_too_many_requests() {
        let resp: ApiResponse<()> = RoloError::ApiRateLimit {
            retry_after: Some(30),
        }
        .into();
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::TooManyRequests);
        assert!(err.message.contains("30"));
    }

    #[test]
    fn rolo_error_multipart_maps_to_invalid_request() {
        let resp: ApiResponse<()> = RoloError::Multipart("boundary missing".into()).into();
        assert_eq!(
            resp.error.as_ref().expect("error").code,
            ErrorCode::InvalidRequest
        );
    }
}
