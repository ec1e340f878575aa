//! Enrichment request/response DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{PaginationResponse, V1EnrichmentStatus};
use crate::models::{Company, CompanyEnrichment};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/enrichment/companies`.
///
/// At least one of `name` or `domain` is required. Within the freshness
/// window cached data is returned unless `forceRefresh` is set.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichCompanyRequest {
    pub name: Option<String>,
    pub domain: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Company payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    /// Unique company ID (nanoid, 21 chars).
    pub company_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Employee-count band, e.g. `"11-50"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// When the company was last successfully enriched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enriched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Company> for CompanyResponse {
    fn from(company: Company) -> Self {
        Self {
            company_id: company.id,
            name: company.name,
            domain: company.domain,
            website: company.website,
            industry: company.industry,
            description: company.description,
            size: company.size,
            location: company.location,
            confidence: company.confidence,
            enriched_at: company.enriched_at,
            created_at: company.created_at,
            updated_at: company.updated_at,
        }
    }
}

/// One recorded enrichment attempt.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentAttemptResponse {
    pub enrichment_id: String,
    pub company_id: String,
    /// The research model used for this attempt.
    pub provider: String,
    pub status: V1EnrichmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub payload: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CompanyEnrichment> for EnrichmentAttemptResponse {
    fn from(e: CompanyEnrichment) -> Self {
        Self {
            enrichment_id: e.id,
            company_id: e.company_id,
            provider: e.provider,
            status: e.status.into(),
            payload: e.payload,
            confidence: e.confidence,
            error_message: e.error_message,
            fetched_at: e.fetched_at,
            created_at: e.created_at,
        }
    }
}

/// Response body for `POST /v1/enrichment/companies` and
/// `POST /v1/cards/{cardId}:enrich`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichCompanyResponse {
    pub company: CompanyResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentAttemptResponse>,
    /// `false` when cached data inside the freshness window was returned
    /// without an external call.
    pub refreshed: bool,
}

/// Response body for `GET /v1/enrichment/companies/{companyId}`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetailResponse {
    pub company: CompanyResponse,
    /// Past enrichment attempts, newest first.
    pub enrichments: Vec<EnrichmentAttemptResponse>,
}

/// Response body for `GET /v1/enrichment/companies`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListCompaniesResponse {
    pub companies: Vec<CompanyResponse>,
    pub pagination: PaginationResponse,
}

/// Query parameters for `GET /v1/enrichment/companies`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListCompaniesQuery {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrich_request_force_refresh_defaults_false() {
        let req: EnrichCompanyRequest =
            serde_json::from_str(r#"{"domain": "techcorp.com"}"#).unwrap();
        assert!(!req.force_refresh);
        assert_eq!(req.domain.as_deref(), Some("techcorp.com"));
    }

    #[test]
    fn company_response_serializes_camel_case() {
        let company = Company::new("co_1".to_string(), "Tech Corp".to_string());
        let resp: CompanyResponse = company.into();
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["companyId"], "co_1");
        assert_eq!(json["name"], "Tech Corp");
        assert!(json.get("enrichedAt").is_none());
    }
}
