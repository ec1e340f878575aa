use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EnrichmentStatus;

/// Deduplicated organization record, keyed by domain when known and by
/// case-insensitive name otherwise. Enrichment merges are last-write-wins
/// per field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub domain: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub confidence: Option<f32>,
    /// When the company was last successfully enriched. Governs the
    /// freshness window for cached enrichment data.
    pub enriched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(id: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            domain: None,
            website: None,
            industry: None,
            description: None,
            size: None,
            location: None,
            confidence: None,
            enriched_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single enrichment attempt against a company. One row per attempt;
/// failures are recorded rather than retried inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyEnrichment {
    pub id: String,
    pub company_id: String,
    pub provider: String,
    pub status: EnrichmentStatus,
    pub payload: Option<serde_json::Value>,
    pub confidence: Option<f32>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CompanyEnrichment {
    pub fn new(id: String, company_id: String, provider: String) -> Self {
        Self {
            id,
            company_id,
            provider,
            status: EnrichmentStatus::Pending,
            payload: None,
            confidence: None,
            error_message: None,
            retry_count: 0,
            fetched_at: None,
            created_at: Utc::now(),
        }
    }
}
