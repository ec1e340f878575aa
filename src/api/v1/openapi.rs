use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rolo API",
        version = "1.0.0",
        description = "Self-hostable business card digitization backend. REST API for card scanning, OCR extraction, and company enrichment.",
    ),
    paths(
        handlers::health::health_check,
        handlers::cards::create_card,
        handlers::cards::get_card,
        handlers::cards::update_card,
        handlers::cards::delete_card,
        handlers::cards::list_cards,
        handlers::cards::search_cards,
        handlers::cards::enrich_card,
        handlers::upload::upload_images,
        handlers::scan::scan_card,
        handlers::scan::get_scan_job,
        handlers::enrichment::enrich_company,
        handlers::enrichment::get_company,
        handlers::enrichment::list_companies,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        // Common
        dto::common::V1CardSource,
        dto::common::V1JobStatus,
        dto::common::V1EnrichmentStatus,
        dto::common::PaginationResponse,
        // Cards
        dto::cards::CreateCardRequest,
        dto::cards::UpdateCardRequest,
        dto::cards::ListCardsQuery,
        dto::cards::SearchCardsRequest,
        dto::cards::CardResponse,
        dto::cards::CardSummaryResponse,
        dto::cards::ListCardsResponse,
        // Upload
        dto::upload::VariantResponse,
        dto::upload::UploadedImageResponse,
        dto::upload::UploadFailureResponse,
        dto::upload::UploadResponse,
        // Scan
        dto::scan::OcrJobResponse,
        dto::scan::ScanResponse,
        // Enrichment
        dto::enrichment::EnrichCompanyRequest,
        dto::enrichment::CompanyResponse,
        dto::enrichment::EnrichmentAttemptResponse,
        dto::enrichment::EnrichCompanyResponse,
        dto::enrichment::CompanyDetailResponse,
        dto::enrichment::ListCompaniesResponse,
        // Health
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
        handlers::health::OcrStatus,
        handlers::health::StorageStatus,
        handlers::health::EnrichmentStatusInfo,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "cards", description = "Card CRUD and search"),
        (name = "upload", description = "Image upload and variants"),
        (name = "scan", description = "Card scanning and OCR jobs"),
        (name = "enrichment", description = "Company data enrichment"),
    )
)]
pub struct ApiDoc;

/// `GET /api/v1/openapi.json`
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Redoc UI mounted at `/docs`.
pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).expect("serialize OpenAPI doc");
        assert!(json["openapi"].as_str().unwrap().starts_with('3'));
        assert!(json["paths"].get("/api/v1/health").is_some());
        assert!(json["paths"].get("/api/v1/scan").is_some());
    }
}
