//! v1 Upload handler.
//!
//! Accepts `multipart/form-data` bodies with one `image` part and/or repeated
//! `images` parts, runs each through validation, derivative generation, and
//! storage, and reports per-file outcomes.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use crate::api::v1::dto::{UploadFailureResponse, UploadResponse, UploadedImageResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::multipart::{self, Part};

/// Decode a multipart request body using the boundary from its content type.
pub(super) fn decode_multipart(headers: &HeaderMap, body: &[u8]) -> Result<Vec<Part>, String> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "Missing Content-Type header".to_string())?;

    let boundary = multipart::boundary_from_content_type(content_type)
        .ok_or_else(|| "Expected multipart/form-data with a boundary".to_string())?;

    multipart::parse(body, &boundary).map_err(|e| e.to_string())
}

/// File parts named `image` or `images`, in body order.
pub(super) fn image_parts(parts: &[Part]) -> Vec<&Part> {
    parts
        .iter()
        .filter(|p| p.is_file() && (p.name == "image" || p.name == "images"))
        .collect()
}

/// `POST /api/v1/upload`
///
/// Validates and stores uploaded card images with all derivatives. Rejected
/// files are reported in `failures` while valid ones are processed; the
/// request errors only when no file part is present at all.
#[utoipa::path(
    post,
    path = "/api/v1/upload",
    tag = "upload",
    operation_id = "upload.images",
    request_body(content_type = "multipart/form-data", content = String, description = "One `image` part and/or repeated `images` parts"),
    responses(
        (status = 200, description = "Upload processed", body = UploadResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn upload_images(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse<UploadResponse> {
    let parts = match decode_multipart(&headers, &body) {
        Ok(parts) => parts,
        Err(e) => return ApiResponse::error(ErrorCode::InvalidRequest, e),
    };

    let files = image_parts(&parts);
    if files.is_empty() {
        return ApiResponse::error(
            ErrorCode::InvalidRequest,
            "Missing required 'image' or 'images' file field",
        );
    }

    let mut images = Vec::new();
    let mut failures = Vec::new();

    for part in files {
        // Content-addressed keys: re-uploading the same bytes overwrites the
        // same objects instead of accumulating duplicates.
        let digest = format!("{:x}", Sha256::digest(&part.data));
        let key_prefix = format!("uploads/{}", &digest[..16]);
        match state.pipeline.ingest(&part.data, &key_prefix).await {
            Ok(upload) => {
                images.push(UploadedImageResponse::from_upload(
                    upload,
                    part.file_name.clone(),
                ));
            }
            Err(e) => {
                tracing::warn!(
                    file_name = ?part.file_name,
                    error = %e,
                    "Rejected uploaded image"
                );
                failures.push(UploadFailureResponse {
                    file_name: part.file_name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let message = format!(
        "{} image(s) stored, {} rejected",
        images.len(),
        failures.len()
    );
    ApiResponse::success(UploadResponse { images, failures }).with_message(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend(format!("--{boundary}\r\n").into_bytes());
            match file_name {
                Some(f) => body.extend(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n"
                    )
                    .into_bytes(),
                ),
                None => body.extend(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n").into_bytes(),
                ),
            }
            body.extend(b"\r\n");
            body.extend_from_slice(data);
            body.extend(b"\r\n");
        }
        body.extend(format!("--{boundary}--\r\n").into_bytes());
        body
    }

    #[test]
    fn decode_multipart_requires_content_type() {
        let headers = HeaderMap::new();
        let err = decode_multipart(&headers, b"anything").unwrap_err();
        assert!(err.contains("Content-Type"));
    }

    #[test]
    fn decode_multipart_rejects_json_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );
        let err = decode_multipart(&headers, b"{}").unwrap_err();
        assert!(err.contains("multipart/form-data"));
    }

    #[test]
    fn image_parts_selects_file_fields_only() {
        let boundary = "XBOUNDARY";
        let body = multipart_body(
            boundary,
            &[
                ("image", Some("a.png"), b"png-a"),
                ("images", Some("b.png"), b"png-b"),
                ("image", None, b"not a file"),
                ("notes", Some("c.png"), b"wrong field name"),
            ],
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}")
                .parse()
                .unwrap(),
        );

        let parts = decode_multipart(&headers, &body).unwrap();
        let files = image_parts(&parts);

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name.as_deref(), Some("a.png"));
        assert_eq!(files[1].file_name.as_deref(), Some("b.png"));
    }
}
