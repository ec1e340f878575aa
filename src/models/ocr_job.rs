use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OcrJobStatus;

/// Async unit of work linking a card to a requested OCR operation.
///
/// Created `queued` when a scan is accepted; a background worker moves it
/// through `processing` to `completed`/`failed`. Failures record the error
/// message and bump `retry_count`; there is no inline auto-retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrJob {
    pub id: String,
    pub card_id: String,
    pub status: OcrJobStatus,
    /// Object-store key of the OCR-optimized image variant.
    pub image_key: Option<String>,
    /// Threshold-filtered raw text joined from detected lines.
    pub raw_text: Option<String>,
    /// Structured extraction result payload.
    pub fields: Option<serde_json::Value>,
    pub confidence: Option<f32>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl OcrJob {
    pub fn new(id: String, card_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            card_id,
            status: OcrJobStatus::Queued,
            image_key: None,
            raw_text: None,
            fields: None,
            confidence: None,
            error_message: None,
            retry_count: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}
