//! v1 Enrichment handlers.
//!
//! Company enrichment by name/domain, company retrieval with attempt
//! history, and company listing.

use axum::extract::{Path, State};
use axum_extra::extract::Query;

use crate::api::v1::dto::{
    CompanyDetailResponse, CompanyResponse, EnrichCompanyRequest, EnrichCompanyResponse,
    ListCompaniesQuery, ListCompaniesResponse,
};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::enrichment::EnrichRequest;

/// `POST /api/v1/enrichment/companies`
///
/// Enriches a company identified by `domain` (preferred) or `name`. Within
/// the freshness window cached data is returned without an external call
/// unless `forceRefresh` is set.
#[utoipa::path(
    post,
    path = "/api/v1/enrichment/companies",
    tag = "enrichment",
    operation_id = "enrichment.enrichCompany",
    request_body = EnrichCompanyRequest,
    responses(
        (status = 200, description = "Company enriched or served from cache", body = EnrichCompanyResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 429, description = "Enrichment rate limit exceeded", body = ApiError),
        (status = 501, description = "No enrichment provider configured", body = ApiError),
    )
)]
pub async fn enrich_company(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<EnrichCompanyRequest>,
) -> ApiResponse<EnrichCompanyResponse> {
    let request = EnrichRequest {
        name: req.name,
        domain: req.domain,
        force_refresh: req.force_refresh,
    };

    match state.enrichment.enrich(&request).await {
        Ok(outcome) => {
            let message = if outcome.refreshed {
                "Company enriched"
            } else {
                "Returned cached enrichment"
            };
            ApiResponse::success(EnrichCompanyResponse {
                company: outcome.company.into(),
                enrichment: outcome.enrichment.map(Into::into),
                refreshed: outcome.refreshed,
            })
            .with_message(message)
        }
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/enrichment/companies/{companyId}`
///
/// Fetches a company and its enrichment attempt history, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/enrichment/companies/{companyId}",
    tag = "enrichment",
    operation_id = "enrichment.getCompany",
    params(("companyId" = String, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company found", body = CompanyDetailResponse),
        (status = 404, description = "Company not found", body = ApiError),
    )
)]
pub async fn get_company(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> ApiResponse<CompanyDetailResponse> {
    let company = match state.db.get_company_by_id(&company_id).await {
        Ok(Some(company)) => company,
        Ok(None) => {
            return ApiResponse::error(
                ErrorCode::NotFound,
                format!("Company {company_id} not found"),
            )
        }
        Err(e) => return e.into(),
    };

    let enrichments = match state.db.get_enrichments_by_company(&company_id).await {
        Ok(enrichments) => enrichments,
        Err(e) => return e.into(),
    };

    ApiResponse::success(CompanyDetailResponse {
        company: company.into(),
        enrichments: enrichments.into_iter().map(Into::into).collect(),
    })
}

/// `GET /api/v1/enrichment/companies`
///
/// Lists companies alphabetically with cursor pagination.
#[utoipa::path(
    get,
    path = "/api/v1/enrichment/companies",
    tag = "enrichment",
    operation_id = "enrichment.listCompanies",
    params(ListCompaniesQuery),
    responses(
        (status = 200, description = "Companies listed", body = ListCompaniesResponse),
    )
)]
pub async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<ListCompaniesQuery>,
) -> ApiResponse<ListCompaniesResponse> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let page = query
        .cursor
        .as_ref()
        .and_then(|c| c.parse::<u32>().ok())
        .unwrap_or(1);

    let (companies, pagination) = match state.db.list_companies(limit, page).await {
        Ok(result) => result,
        Err(e) => return e.into(),
    };

    let companies: Vec<CompanyResponse> = companies.into_iter().map(Into::into).collect();

    ApiResponse::success(ListCompaniesResponse {
        companies,
        pagination: pagination.into(),
    })
}
