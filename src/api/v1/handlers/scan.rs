//! v1 Scan handlers.
//!
//! `POST /scan` accepts a multipart card image, creates the card record, and
//! queues the OCR job; `GET /scan/{jobId}` polls the job. The OCR itself runs
//! asynchronously (fire-and-forget spawn plus the background sweep).

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;

use crate::api::v1::dto::{OcrJobResponse, ScanResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;

use super::upload::{decode_multipart, image_parts};

/// `POST /api/v1/scan`
///
/// Multipart form with a single `image` file part and optional `tags`
/// (comma-separated) and `notes` fields. Returns 202 with the created card
/// and its queued OCR job.
#[utoipa::path(
    post,
    path = "/api/v1/scan",
    tag = "scan",
    operation_id = "scan.create",
    request_body(content_type = "multipart/form-data", content = String, description = "One `image` part with optional `tags` and `notes` fields"),
    responses(
        (status = 202, description = "Card created, OCR queued", body = ScanResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn scan_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse<ScanResponse> {
    let parts = match decode_multipart(&headers, &body) {
        Ok(parts) => parts,
        Err(e) => return ApiResponse::error(ErrorCode::InvalidRequest, e),
    };

    let files = image_parts(&parts);
    let image = match files.as_slice() {
        [] => {
            return ApiResponse::error(ErrorCode::InvalidRequest, "Missing required 'image' field")
        }
        [single] => *single,
        _ => {
            return ApiResponse::error(
                ErrorCode::InvalidRequest,
                "Scan accepts exactly one image per request",
            )
        }
    };

    let mut tags = Vec::new();
    let mut notes = None;
    for part in &parts {
        match part.name.as_str() {
            "tags" if !part.is_file() => {
                tags = part
                    .text()
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
            }
            "notes" if !part.is_file() => {
                let text = part.text();
                let text = text.trim();
                if !text.is_empty() {
                    notes = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    let (card, job) = match state.pipeline.scan(&image.data, tags, notes).await {
        Ok(result) => result,
        Err(e) => return e.into(),
    };

    // Fire-and-forget OCR; the background sweep catches missed spawns.
    let pipeline = state.pipeline.clone();
    let job_id = job.id.clone();
    tokio::spawn(async move {
        if let Err(e) = pipeline.process_job(&job_id).await {
            tracing::error!(job_id = %job_id, error = %e, "Failed to process OCR job");
        }
    });

    ApiResponse::accepted(ScanResponse {
        card: card.into(),
        job: job.into(),
    })
    .with_message("Card created, OCR queued")
}

/// `GET /api/v1/scan/{jobId}`
///
/// Polls an OCR job. Completed jobs carry the raw text and extracted fields.
#[utoipa::path(
    get,
    path = "/api/v1/scan/{jobId}",
    tag = "scan",
    operation_id = "scan.getJob",
    params(("jobId" = String, Path, description = "OCR job ID")),
    responses(
        (status = 200, description = "Job status", body = OcrJobResponse),
        (status = 404, description = "Job not found", body = ApiError),
    )
)]
pub async fn get_scan_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResponse<OcrJobResponse> {
    match state.db.get_ocr_job_by_id(&job_id).await {
        Ok(Some(job)) => ApiResponse::success(job.into()),
        Ok(None) => {
            ApiResponse::error(ErrorCode::NotFound, format!("OCR job {job_id} not found"))
        }
        Err(e) => e.into(),
    }
}
