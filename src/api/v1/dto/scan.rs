//! Scan request/response DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cards::CardResponse;
use super::common::V1JobStatus;
use crate::models::OcrJob;

/// OCR job payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OcrJobResponse {
    /// Unique job ID (nanoid, 21 chars).
    pub job_id: String,
    pub card_id: String,
    pub status: V1JobStatus,
    /// Threshold-filtered raw OCR text, present once the job completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    /// Structured extraction result, present once the job completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub fields: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<OcrJob> for OcrJobResponse {
    fn from(job: OcrJob) -> Self {
        Self {
            job_id: job.id,
            card_id: job.card_id,
            status: job.status.into(),
            raw_text: job.raw_text,
            fields: job.fields,
            confidence: job.confidence,
            error_message: job.error_message,
            retry_count: job.retry_count,
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

/// Response body for `POST /v1/scan` — card created, OCR queued.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub card: CardResponse,
    pub job: OcrJobResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_response_serializes_camel_case() {
        let job = OcrJob::new("job_1".to_string(), "card_1".to_string());
        let resp: OcrJobResponse = job.into();
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["jobId"], "job_1");
        assert_eq!(json["cardId"], "card_1");
        assert_eq!(json["status"], "queued");
        assert!(json.get("rawText").is_none());
        assert!(json.get("completedAt").is_none());
    }
}
