//! Card request/response DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{PaginationResponse, V1CardSource};
use crate::models::{Card, CardSummary};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/cards`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl CreateCardRequest {
    /// A manual card must carry at least one identifying field.
    pub fn has_any_field(&self) -> bool {
        [
            &self.name,
            &self.company,
            &self.email,
            &self.phone,
            &self.website,
        ]
        .iter()
        .any(|f| f.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

/// Request body for `PATCH /v1/cards/{cardId}`.
///
/// Only provided fields are changed. An explicit empty string clears the
/// corresponding field.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Query parameters for `GET /v1/cards`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListCardsQuery {
    /// Filter by tags (all must match).
    pub tags: Option<Vec<String>>,
    /// Maximum results per page (default 20, max 100).
    pub limit: Option<u32>,
    /// Opaque cursor for pagination.
    pub cursor: Option<String>,
}

/// Request body for `POST /v1/cards:search`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchCardsRequest {
    /// Free-text query matched against name, company, email, notes and the
    /// card's OCR text.
    pub q: String,
    pub tags: Option<Vec<String>>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Full card payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    /// Unique card ID (nanoid, 21 chars).
    pub card_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_image_url: Option<String>,
    /// Threshold-filtered raw OCR text, when the card came from a scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    /// Mean OCR confidence (0-1) of the retained lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,
    pub source: V1CardSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Card> for CardResponse {
    fn from(card: Card) -> Self {
        Self {
            card_id: card.id,
            name: card.name,
            title: card.title,
            company: card.company,
            email: card.email,
            phone: card.phone,
            website: card.website,
            address: card.address,
            notes: card.notes,
            tags: card.tags,
            image_url: card.image_url,
            thumbnail_url: card.thumbnail_url,
            web_image_url: card.web_image_url,
            ocr_text: card.ocr_text,
            ocr_confidence: card.ocr_confidence,
            source: card.source.into(),
            company_id: card.company_id,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

/// Abbreviated card payload for list/search responses.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardSummaryResponse {
    pub card_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub tags: Vec<String>,
    pub source: V1CardSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CardSummary> for CardSummaryResponse {
    fn from(summary: CardSummary) -> Self {
        Self {
            card_id: summary.id,
            name: summary.name,
            title: summary.title,
            company: summary.company,
            email: summary.email,
            thumbnail_url: summary.thumbnail_url,
            tags: summary.tags,
            source: summary.source.into(),
            created_at: summary.created_at,
            updated_at: summary.updated_at,
        }
    }
}

/// Response body for `GET /v1/cards` and `POST /v1/cards:search`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListCardsResponse {
    pub cards: Vec<CardSummaryResponse>,
    pub pagination: PaginationResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardSource;

    #[test]
    fn card_response_serializes_camel_case() {
        let mut card = Card::new("card_1".to_string());
        card.name = Some("John Smith".to_string());
        card.thumbnail_url = Some("https://cdn.example.com/t.jpg".to_string());
        card.source = CardSource::Scan;

        let resp: CardResponse = card.into();
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["cardId"], "card_1");
        assert_eq!(json["thumbnailUrl"], "https://cdn.example.com/t.jpg");
        assert_eq!(json["source"], "scan");
        assert!(json.get("ocrText").is_none(), "absent fields are omitted");
    }

    #[test]
    fn create_card_request_has_any_field() {
        let req: CreateCardRequest = serde_json::from_str(r#"{"notes": "met at expo"}"#).unwrap();
        assert!(!req.has_any_field());

        let req: CreateCardRequest = serde_json::from_str(r#"{"email": "a@b.com"}"#).unwrap();
        assert!(req.has_any_field());

        let req: CreateCardRequest = serde_json::from_str(r#"{"name": "   "}"#).unwrap();
        assert!(!req.has_any_field(), "whitespace-only fields do not count");
    }
}
