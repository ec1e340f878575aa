use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Card, CardSummary, Company, CompanyEnrichment, ListCardsRequest, OcrJob, OcrJobStatus,
    Pagination,
};

// ---------------------------------------------------------------------------
// Individual store traits
// ---------------------------------------------------------------------------

/// CRUD and query operations for cards.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn create_card(&self, card: &Card) -> Result<()>;
    async fn get_card_by_id(&self, id: &str) -> Result<Option<Card>>;
    async fn update_card(&self, card: &Card) -> Result<()>;
    async fn delete_card(&self, id: &str) -> Result<bool>;
    async fn list_cards(&self, req: &ListCardsRequest) -> Result<(Vec<CardSummary>, Pagination)>;
}

/// CRUD and worker-queue operations for OCR jobs.
#[async_trait]
pub trait OcrJobStore: Send + Sync {
    async fn create_ocr_job(&self, job: &OcrJob) -> Result<()>;
    async fn get_ocr_job_by_id(&self, id: &str) -> Result<Option<OcrJob>>;
    async fn get_ocr_jobs_by_card(&self, card_id: &str) -> Result<Vec<OcrJob>>;
    /// Queued jobs with `retry_count` below the given cap, oldest first.
    async fn get_queued_ocr_jobs(&self, limit: u32, max_retries: i32) -> Result<Vec<OcrJob>>;
    async fn update_ocr_job_status(
        &self,
        id: &str,
        status: OcrJobStatus,
        error: Option<&str>,
    ) -> Result<()>;
    /// Mark a job completed with its extraction payload.
    async fn complete_ocr_job(
        &self,
        id: &str,
        raw_text: &str,
        fields: &serde_json::Value,
        confidence: f32,
    ) -> Result<()>;
}

/// CRUD, dedup lookup, and enrichment-tracking operations for companies.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn create_company(&self, company: &Company) -> Result<()>;
    async fn get_company_by_id(&self, id: &str) -> Result<Option<Company>>;
    async fn get_company_by_domain(&self, domain: &str) -> Result<Option<Company>>;
    async fn get_company_by_name(&self, name: &str) -> Result<Option<Company>>;
    async fn update_company(&self, company: &Company) -> Result<()>;
    async fn list_companies(&self, limit: u32, page: u32) -> Result<(Vec<Company>, Pagination)>;

    async fn create_enrichment(&self, enrichment: &CompanyEnrichment) -> Result<()>;
    async fn get_latest_enrichment(&self, company_id: &str) -> Result<Option<CompanyEnrichment>>;
    async fn get_enrichments_by_company(&self, company_id: &str)
        -> Result<Vec<CompanyEnrichment>>;
}

// ---------------------------------------------------------------------------
// Unified backend supertrait
// ---------------------------------------------------------------------------

/// A complete database backend that combines all store traits plus lifecycle
/// operations (initialization, sync).
#[async_trait]
pub trait DatabaseBackend: CardStore + OcrJobStore + CompanyStore {
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;
}
