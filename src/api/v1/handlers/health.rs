use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;
use crate::enrichment::EnrichmentBackend;

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub database: DatabaseStatus,
    pub ocr: OcrStatus,
    pub storage: StorageStatus,
    pub enrichment: EnrichmentStatusInfo,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DatabaseStatus {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct OcrStatus {
    pub status: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StorageStatus {
    pub status: String,
    pub backend: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct EnrichmentStatusInfo {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let db_status = match state.db.sync().await {
        Ok(_) => DatabaseStatus {
            status: "ok".to_string(),
        },
        Err(_) => DatabaseStatus {
            status: "error".to_string(),
        },
    };

    let ocr_status = OcrStatus {
        status: if state.pipeline.ocr_available() {
            "available".to_string()
        } else {
            "unavailable".to_string()
        },
        model: state.config.ocr.model.clone(),
    };

    let storage_status = StorageStatus {
        status: if state.pipeline.storage_available() {
            "available".to_string()
        } else {
            "unavailable".to_string()
        },
        backend: state.pipeline.storage().backend_name().to_string(),
    };

    let enrichment_provider = state.enrichment.provider();
    let enrichment_status = if enrichment_provider.is_available() {
        let provider = match enrichment_provider.backend() {
            EnrichmentBackend::OpenAI => "openai",
            EnrichmentBackend::OpenRouter => "openrouter",
            EnrichmentBackend::Ollama => "ollama",
            EnrichmentBackend::LmStudio => "lmstudio",
            EnrichmentBackend::OpenAICompatible { .. } => "openai-compatible",
            EnrichmentBackend::Unavailable { .. } => "unavailable",
        };
        let model = enrichment_provider.config().map(|c| c.model.clone());
        EnrichmentStatusInfo {
            status: "available".to_string(),
            provider: Some(provider.to_string()),
            model,
        }
    } else {
        EnrichmentStatusInfo {
            status: "unavailable".to_string(),
            provider: None,
            model: None,
        }
    };

    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        ocr: ocr_status,
        storage: storage_status,
        enrichment: enrichment_status,
    })
}
