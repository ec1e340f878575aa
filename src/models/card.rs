use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::CardSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub web_image_url: Option<String>,
    pub ocr_text: Option<String>,
    pub ocr_confidence: Option<f32>,
    pub source: CardSource,
    pub company_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: None,
            title: None,
            company: None,
            email: None,
            phone: None,
            website: None,
            address: None,
            notes: None,
            tags: Vec::new(),
            image_url: None,
            thumbnail_url: None,
            web_image_url: None,
            ocr_text: None,
            ocr_confidence: None,
            source: CardSource::default(),
            company_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCardRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub company: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 64))]
    pub phone: Option<String>,
    #[validate(length(max = 2048))]
    pub website: Option<String>,
    #[validate(length(max = 1024))]
    pub address: Option<String>,
    #[validate(length(max = 10_000))]
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListCardsRequest {
    /// Free-text query matched against name, company, email, notes and OCR text.
    pub q: Option<String>,
    pub tags: Option<Vec<String>>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub order: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSummary {
    pub id: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tags: Vec<String>,
    pub source: CardSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Card> for CardSummary {
    fn from(card: Card) -> Self {
        Self {
            id: card.id,
            name: card.name,
            title: card.title,
            company: card.company,
            email: card.email,
            thumbnail_url: card.thumbnail_url,
            tags: card.tags,
            source: card.source,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_card_has_empty_contact_fields() {
        let card = Card::new("card_1".to_string());
        assert!(card.name.is_none());
        assert!(card.email.is_none());
        assert!(card.tags.is_empty());
        assert_eq!(card.source, CardSource::Manual);
    }

    #[test]
    fn test_create_card_request_validates_email() {
        let req = CreateCardRequest {
            name: Some("Jane Doe".to_string()),
            title: None,
            company: None,
            email: Some("not-an-email".to_string()),
            phone: None,
            website: None,
            address: None,
            notes: None,
            tags: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_card_request_accepts_valid_email() {
        let req = CreateCardRequest {
            name: Some("Jane Doe".to_string()),
            title: None,
            company: None,
            email: Some("jane@example.com".to_string()),
            phone: None,
            website: None,
            address: None,
            notes: None,
            tags: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_card_summary_from_card() {
        let mut card = Card::new("card_2".to_string());
        card.name = Some("John Smith".to_string());
        card.tags = vec!["conference".to_string()];

        let summary: CardSummary = card.into();
        assert_eq!(summary.id, "card_2");
        assert_eq!(summary.name.as_deref(), Some("John Smith"));
        assert_eq!(summary.tags, vec!["conference"]);
    }
}
