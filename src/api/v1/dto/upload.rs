//! Upload request/response DTOs for the v1 API.

use serde::Serialize;

use crate::imaging::VariantKind;
use crate::services::{StoredUpload, StoredVariant};

/// One stored derivative of an uploaded image.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariantResponse {
    /// Derivative purpose: `ocr`, `thumbnail`, `web`, or `storage`.
    pub kind: VariantKind,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

impl From<StoredVariant> for VariantResponse {
    fn from(v: StoredVariant) -> Self {
        Self {
            kind: v.kind,
            url: v.url,
            width: v.width,
            height: v.height,
            size_bytes: v.size_bytes,
        }
    }
}

/// A successfully processed upload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImageResponse {
    /// Server-assigned upload ID.
    pub upload_id: String,
    /// Original file name as sent by the client, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub width: u32,
    pub height: u32,
    /// `width / height`, rounded to two decimal places.
    pub aspect_ratio: f32,
    pub variants: Vec<VariantResponse>,
}

impl UploadedImageResponse {
    pub fn from_upload(upload: StoredUpload, file_name: Option<String>) -> Self {
        Self {
            upload_id: upload.id.clone(),
            file_name,
            width: upload.width,
            height: upload.height,
            aspect_ratio: upload.aspect_ratio,
            variants: upload.variants.into_iter().map(Into::into).collect(),
        }
    }
}

/// A rejected file within a multi-image upload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadFailureResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub error: String,
}

/// Response body for `POST /v1/upload`.
///
/// Per-file outcomes: valid images land in `images`, rejected ones in
/// `failures`. The request fails outright only when no file part was sent.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub images: Vec<UploadedImageResponse>,
    pub failures: Vec<UploadFailureResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_response_serializes_camel_case() {
        let resp = VariantResponse {
            kind: VariantKind::Thumbnail,
            url: "https://cdn.example.com/t.jpg".to_string(),
            width: 320,
            height: 200,
            size_bytes: 5120,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["kind"], "thumbnail");
        assert_eq!(json["sizeBytes"], 5120);
    }
}
