//! Shared DTO types used across multiple v1 API endpoints.

use serde::{Deserialize, Serialize};

use crate::models::{CardSource, EnrichmentStatus, OcrJobStatus, Pagination};

/// Card origin for the v1 API.
///
/// Wire format: `"scan"`, `"manual"`, or `"import"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum V1CardSource {
    Scan,
    Manual,
    Import,
}

impl From<CardSource> for V1CardSource {
    fn from(source: CardSource) -> Self {
        match source {
            CardSource::Scan => V1CardSource::Scan,
            CardSource::Manual => V1CardSource::Manual,
            CardSource::Import => V1CardSource::Import,
        }
    }
}

/// OCR job state for the v1 API.
///
/// Wire format: `"queued"`, `"processing"`, `"completed"`, or `"failed"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum V1JobStatus {
    /// The job is waiting for the OCR worker.
    Queued,
    /// The worker is extracting text from the image.
    Processing,
    /// Extraction finished; the card has been filled.
    Completed,
    /// Extraction failed. Check `errorMessage` for details.
    Failed,
}

impl From<OcrJobStatus> for V1JobStatus {
    fn from(status: OcrJobStatus) -> Self {
        match status {
            OcrJobStatus::Queued => V1JobStatus::Queued,
            OcrJobStatus::Processing => V1JobStatus::Processing,
            OcrJobStatus::Completed => V1JobStatus::Completed,
            OcrJobStatus::Failed => V1JobStatus::Failed,
        }
    }
}

/// Enrichment attempt state for the v1 API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum V1EnrichmentStatus {
    Pending,
    Completed,
    Failed,
}

impl From<EnrichmentStatus> for V1EnrichmentStatus {
    fn from(status: EnrichmentStatus) -> Self {
        match status {
            EnrichmentStatus::Pending => V1EnrichmentStatus::Pending,
            EnrichmentStatus::Completed => V1EnrichmentStatus::Completed,
            EnrichmentStatus::Failed => V1EnrichmentStatus::Failed,
        }
    }
}

/// Page-based pagination block included in list payloads.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    pub current_page: u32,
    pub limit: u32,
    pub total_items: u32,
    pub total_pages: u32,
    /// Cursor for the next page; `null` when this is the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<Pagination> for PaginationResponse {
    fn from(p: Pagination) -> Self {
        let next_cursor = if p.current_page < p.total_pages {
            Some((p.current_page + 1).to_string())
        } else {
            None
        };
        Self {
            current_page: p.current_page,
            limit: p.limit,
            total_items: p.total_items,
            total_pages: p.total_pages,
            next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_serializes_lowercase() {
        let json = serde_json::to_value(V1JobStatus::Processing).unwrap();
        assert_eq!(json, "processing");
    }

    #[test]
    fn pagination_next_cursor_present_when_more_pages() {
        let resp: PaginationResponse = Pagination::new(1, 20, 45).into();
        assert_eq!(resp.total_pages, 3);
        assert_eq!(resp.next_cursor.as_deref(), Some("2"));

        let resp: PaginationResponse = Pagination::new(3, 20, 45).into();
        assert!(resp.next_cursor.is_none());
    }
}
