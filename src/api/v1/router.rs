use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::{v1_auth_middleware, v1_rate_limit_middleware};

/// Axum's default 2 MiB body cap is too small for card photos; multipart
/// endpoints get their own ceiling above the per-file validation limit.
const MAX_MULTIPART_BODY: usize = 32 * 1024 * 1024;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let cards = Router::new()
        .route(
            "/",
            get(handlers::cards::list_cards).post(handlers::cards::create_card),
        )
        .route(
            "/{cardId}",
            get(handlers::cards::get_card)
                .patch(handlers::cards::update_card)
                .delete(handlers::cards::delete_card),
        )
        .route("/{cardId}/enrich", post(handlers::cards::enrich_card));

    let scan = Router::new()
        .route(
            "/",
            post(handlers::scan::scan_card).layer(DefaultBodyLimit::max(MAX_MULTIPART_BODY)),
        )
        .route("/{jobId}", get(handlers::scan::get_scan_job));

    let enrichment = Router::new()
        .route(
            "/companies",
            get(handlers::enrichment::list_companies).post(handlers::enrichment::enrich_company),
        )
        .route(
            "/companies/{companyId}",
            get(handlers::enrichment::get_company),
        );

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .nest("/cards", cards)
        .route("/cards:search", post(handlers::cards::search_cards))
        .route(
            "/upload",
            post(handlers::upload::upload_images).layer(DefaultBodyLimit::max(MAX_MULTIPART_BODY)),
        )
        .nest("/scan", scan)
        .nest("/enrichment", enrichment)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            v1_auth_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state,
            v1_rate_limit_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}
