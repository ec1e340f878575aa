//! v1 Card handlers.
//!
//! Card CRUD, listing with cursor pagination, text search, and per-card
//! company enrichment. All responses are wrapped in [`ApiResponse`] envelopes.

use axum::extract::{Path, State};
use axum_extra::extract::Query;
use chrono::Utc;
use nanoid::nanoid;

use crate::api::v1::dto::{
    CardResponse, CardSummaryResponse, CreateCardRequest, EnrichCompanyResponse, ListCardsQuery,
    ListCardsResponse, SearchCardsRequest, UpdateCardRequest,
};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::enrichment::{domain_from_email, normalize_domain, EnrichRequest};
use crate::models::{Card, CardSource, ListCardsRequest};

const MAX_TAGS: usize = 32;
const MAX_TAG_LENGTH: usize = 64;

fn validate_tags(tags: &[String]) -> Option<String> {
    if tags.len() > MAX_TAGS {
        return Some(format!("Too many tags (max {MAX_TAGS})"));
    }
    for tag in tags {
        if tag.trim().is_empty() {
            return Some("Tags cannot be empty".to_string());
        }
        if tag.len() > MAX_TAG_LENGTH {
            return Some(format!("Tag too long (max {MAX_TAG_LENGTH} characters)"));
        }
    }
    None
}

/// Normalize a PATCH field: `None` keeps the current value, an empty string
/// clears it, anything else replaces it.
fn apply_patch(current: &mut Option<String>, update: Option<String>) {
    if let Some(value) = update {
        let trimmed = value.trim();
        *current = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }
}

/// `POST /api/v1/cards`
///
/// Creates a card manually. Returns 201 with the full card.
#[utoipa::path(
    post,
    path = "/api/v1/cards",
    tag = "cards",
    operation_id = "cards.create",
    request_body = CreateCardRequest,
    responses(
        (status = 201, description = "Card created", body = CardResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn create_card(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<CreateCardRequest>,
) -> ApiResponse<CardResponse> {
    if !req.has_any_field() {
        return ApiResponse::error(
            ErrorCode::InvalidRequest,
            "At least one of name, company, email, phone or website is required",
        );
    }

    if let Some(ref tags) = req.tags {
        if let Some(problem) = validate_tags(tags) {
            return ApiResponse::error(ErrorCode::InvalidRequest, problem);
        }
    }

    if let Some(ref email) = req.email {
        if !email.trim().is_empty() && !email.contains('@') {
            return ApiResponse::error(ErrorCode::InvalidRequest, "Invalid email address");
        }
    }

    let mut card = Card::new(nanoid!());
    card.source = CardSource::Manual;
    card.name = req.name.filter(|v| !v.trim().is_empty());
    card.title = req.title.filter(|v| !v.trim().is_empty());
    card.company = req.company.filter(|v| !v.trim().is_empty());
    card.email = req.email.filter(|v| !v.trim().is_empty());
    card.phone = req.phone.filter(|v| !v.trim().is_empty());
    card.website = req.website.filter(|v| !v.trim().is_empty());
    card.address = req.address.filter(|v| !v.trim().is_empty());
    card.notes = req.notes.filter(|v| !v.trim().is_empty());
    card.tags = req.tags.unwrap_or_default();

    if let Err(e) = state.db.create_card(&card).await {
        return e.into();
    }

    ApiResponse::created(card.into()).with_message("Card created")
}

/// `GET /api/v1/cards/{cardId}`
#[utoipa::path(
    get,
    path = "/api/v1/cards/{cardId}",
    tag = "cards",
    operation_id = "cards.get",
    params(("cardId" = String, Path, description = "Card ID")),
    responses(
        (status = 200, description = "Card found", body = CardResponse),
        (status = 404, description = "Card not found", body = ApiError),
    )
)]
pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResponse<CardResponse> {
    match state.db.get_card_by_id(&id).await {
        Ok(Some(card)) => ApiResponse::success(card.into()),
        Ok(None) => ApiResponse::error(ErrorCode::NotFound, format!("Card {id} not found")),
        Err(e) => e.into(),
    }
}

/// `PATCH /api/v1/cards/{cardId}`
///
/// Updates card fields. Omitted fields are unchanged; explicit empty strings
/// clear a field.
#[utoipa::path(
    patch,
    path = "/api/v1/cards/{cardId}",
    tag = "cards",
    operation_id = "cards.update",
    params(("cardId" = String, Path, description = "Card ID")),
    request_body = UpdateCardRequest,
    responses(
        (status = 200, description = "Card updated", body = CardResponse),
        (status = 404, description = "Card not found", body = ApiError),
    )
)]
pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    axum::Json(req): axum::Json<UpdateCardRequest>,
) -> ApiResponse<CardResponse> {
    let mut card = match state.db.get_card_by_id(&id).await {
        Ok(Some(card)) => card,
        Ok(None) => {
            return ApiResponse::error(ErrorCode::NotFound, format!("Card {id} not found"))
        }
        Err(e) => return e.into(),
    };

    if let Some(ref tags) = req.tags {
        if let Some(problem) = validate_tags(tags) {
            return ApiResponse::error(ErrorCode::InvalidRequest, problem);
        }
    }

    apply_patch(&mut card.name, req.name);
    apply_patch(&mut card.title, req.title);
    apply_patch(&mut card.company, req.company);
    apply_patch(&mut card.email, req.email);
    apply_patch(&mut card.phone, req.phone);
    apply_patch(&mut card.website, req.website);
    apply_patch(&mut card.address, req.address);
    apply_patch(&mut card.notes, req.notes);
    if let Some(tags) = req.tags {
        card.tags = tags;
    }
    card.updated_at = Utc::now();

    if let Err(e) = state.db.update_card(&card).await {
        return e.into();
    }

    ApiResponse::success(card.into())
}

/// `DELETE /api/v1/cards/{cardId}`
///
/// Deletes a card. OCR jobs cascade with it.
#[utoipa::path(
    delete,
    path = "/api/v1/cards/{cardId}",
    tag = "cards",
    operation_id = "cards.delete",
    params(("cardId" = String, Path, description = "Card ID")),
    responses(
        (status = 200, description = "Card deleted", body = Object),
        (status = 404, description = "Card not found", body = ApiError),
    )
)]
pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResponse<serde_json::Value> {
    match state.db.delete_card(&id).await {
        Ok(true) => ApiResponse::success(serde_json::json!({ "deleted": true })),
        Ok(false) => ApiResponse::error(ErrorCode::NotFound, format!("Card {id} not found")),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/cards`
///
/// Lists cards with cursor-based pagination and optional tag filtering.
#[utoipa::path(
    get,
    path = "/api/v1/cards",
    tag = "cards",
    operation_id = "cards.list",
    params(ListCardsQuery),
    responses(
        (status = 200, description = "Cards listed", body = ListCardsResponse),
    )
)]
pub async fn list_cards(
    State(state): State<AppState>,
    Query(query): Query<ListCardsQuery>,
) -> ApiResponse<ListCardsResponse> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let page = query
        .cursor
        .as_ref()
        .and_then(|c| c.parse::<u32>().ok())
        .unwrap_or(1);

    let internal_req = ListCardsRequest {
        q: None,
        tags: query.tags,
        limit: Some(limit),
        page: Some(page),
        order: None,
        sort: None,
    };

    let (cards, pagination) = match state.db.list_cards(&internal_req).await {
        Ok(result) => result,
        Err(e) => return e.into(),
    };

    let cards: Vec<CardSummaryResponse> = cards.into_iter().map(Into::into).collect();

    ApiResponse::success(ListCardsResponse {
        cards,
        pagination: pagination.into(),
    })
}

/// `POST /api/v1/cards:search`
///
/// Free-text search over name, company, email, notes, and OCR text.
#[utoipa::path(
    post,
    path = "/api/v1/cards:search",
    tag = "cards",
    operation_id = "cards.search",
    request_body = SearchCardsRequest,
    responses(
        (status = 200, description = "Matching cards", body = ListCardsResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn search_cards(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<SearchCardsRequest>,
) -> ApiResponse<ListCardsResponse> {
    if req.q.trim().is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Search query cannot be empty");
    }

    let limit = req.limit.unwrap_or(20).clamp(1, 100);
    let page = req
        .cursor
        .as_ref()
        .and_then(|c| c.parse::<u32>().ok())
        .unwrap_or(1);

    let internal_req = ListCardsRequest {
        q: Some(req.q),
        tags: req.tags,
        limit: Some(limit),
        page: Some(page),
        order: None,
        sort: None,
    };

    let (cards, pagination) = match state.db.list_cards(&internal_req).await {
        Ok(result) => result,
        Err(e) => return e.into(),
    };

    let cards: Vec<CardSummaryResponse> = cards.into_iter().map(Into::into).collect();

    ApiResponse::success(ListCardsResponse {
        cards,
        pagination: pagination.into(),
    })
}

/// `POST /api/v1/cards/{cardId}/enrich`
///
/// Enriches the card's company (derived from the card's company name and
/// email/website domain) and links the company to the card.
#[utoipa::path(
    post,
    path = "/api/v1/cards/{cardId}/enrich",
    tag = "cards",
    operation_id = "cards.enrich",
    params(("cardId" = String, Path, description = "Card ID")),
    responses(
        (status = 200, description = "Company enriched", body = EnrichCompanyResponse),
        (status = 400, description = "Card has no company information", body = ApiError),
        (status = 404, description = "Card not found", body = ApiError),
    )
)]
pub async fn enrich_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResponse<EnrichCompanyResponse> {
    let mut card = match state.db.get_card_by_id(&id).await {
        Ok(Some(card)) => card,
        Ok(None) => {
            return ApiResponse::error(ErrorCode::NotFound, format!("Card {id} not found"))
        }
        Err(e) => return e.into(),
    };

    let domain = card
        .website
        .as_deref()
        .and_then(normalize_domain)
        .or_else(|| card.email.as_deref().and_then(domain_from_email));

    if card.company.is_none() && domain.is_none() {
        return ApiResponse::error(
            ErrorCode::InvalidRequest,
            "Card has no company name, website, or email domain to enrich from",
        );
    }

    let request = EnrichRequest {
        name: card.company.clone(),
        domain,
        force_refresh: false,
    };

    let outcome = match state.enrichment.enrich(&request).await {
        Ok(outcome) => outcome,
        Err(e) => return e.into(),
    };

    if card.company_id.as_deref() != Some(outcome.company.id.as_str()) {
        card.company_id = Some(outcome.company.id.clone());
        card.updated_at = Utc::now();
        if let Err(e) = state.db.update_card(&card).await {
            return e.into();
        }
    }

    ApiResponse::success(EnrichCompanyResponse {
        company: outcome.company.into(),
        enrichment: outcome.enrichment.map(Into::into),
        refreshed: outcome.refreshed,
    })
}
