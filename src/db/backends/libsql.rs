use async_trait::async_trait;

use crate::db::connection::Database;
use crate::db::repository::{CardRepository, CompanyRepository, OcrJobRepository};
use crate::db::traits::{CardStore, CompanyStore, DatabaseBackend, OcrJobStore};
use crate::error::Result;
use crate::models::{
    Card, CardSummary, Company, CompanyEnrichment, ListCardsRequest, OcrJob, OcrJobStatus,
    Pagination,
};

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CardStore for LibSqlBackend {
    async fn create_card(&self, card: &Card) -> Result<()> {
        let conn = self.db.connect()?;
        CardRepository::create(&conn, card).await
    }
    async fn get_card_by_id(&self, id: &str) -> Result<Option<Card>> {
        let conn = self.db.connect()?;
        CardRepository::get_by_id(&conn, id).await
    }
    async fn update_card(&self, card: &Card) -> Result<()> {
        let conn = self.db.connect()?;
        CardRepository::update(&conn, card).await
    }
    async fn delete_card(&self, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        CardRepository::delete(&conn, id).await
    }
    async fn list_cards(&self, req: &ListCardsRequest) -> Result<(Vec<CardSummary>, Pagination)> {
        let conn = self.db.connect()?;
        CardRepository::list(&conn, req).await
    }
}

#[async_trait]
impl OcrJobStore for LibSqlBackend {
    async fn create_ocr_job(&self, job: &OcrJob) -> Result<()> {
        let conn = self.db.connect()?;
        OcrJobRepository::create(&conn, job).await
    }
    async fn get_ocr_job_by_id(&self, id: &str) -> Result<Option<OcrJob>> {
        let conn = self.db.connect()?;
        OcrJobRepository::get_by_id(&conn, id).await
    }
    async fn get_ocr_jobs_by_card(&self, card_id: &str) -> Result<Vec<OcrJob>> {
        let conn = self.db.connect()?;
        OcrJobRepository::get_by_card(&conn, card_id).await
    }
    async fn get_queued_ocr_jobs(&self, limit: u32, max_retries: i32) -> Result<Vec<OcrJob>> {
        let conn = self.db.connect()?;
        OcrJobRepository::get_queued(&conn, limit, max_retries).await
    }
    async fn update_ocr_job_status(
        &self,
        id: &str,
        status: OcrJobStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let conn = self.db.connect()?;
        OcrJobRepository::update_status(&conn, id, status, error).await
    }
    async fn complete_ocr_job(
        &self,
        id: &str,
        raw_text: &str,
        fields: &serde_json::Value,
        confidence: f32,
    ) -> Result<()> {
        let conn = self.db.connect()?;
        OcrJobRepository::complete(&conn, id, raw_text, fields, confidence).await
    }
}

#[async_trait]
impl CompanyStore for LibSqlBackend {
    async fn create_company(&self, company: &Company) -> Result<()> {
        let conn = self.db.connect()?;
        CompanyRepository::create(&conn, company).await
    }
    async fn get_company_by_id(&self, id: &str) -> Result<Option<Company>> {
        let conn = self.db.connect()?;
        CompanyRepository::get_by_id(&conn, id).await
    }
    async fn get_company_by_domain(&self, domain: &str) -> Result<Option<Company>> {
        let conn = self.db.connect()?;
        CompanyRepository::get_by_domain(&conn, domain).await
    }
    async fn get_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let conn = self.db.connect()?;
        CompanyRepository::get_by_name(&conn, name).await
    }
    async fn update_company(&self, company: &Company) -> Result<()> {
        let conn = self.db.connect()?;
        CompanyRepository::update(&conn, company).await
    }
    async fn list_companies(&self, limit: u32, page: u32) -> Result<(Vec<Company>, Pagination)> {
        let conn = self.db.connect()?;
        CompanyRepository::list(&conn, limit, page).await
    }

    async fn create_enrichment(&self, enrichment: &CompanyEnrichment) -> Result<()> {
        let conn = self.db.connect()?;
        CompanyRepository::create_enrichment(&conn, enrichment).await
    }
    async fn get_latest_enrichment(&self, company_id: &str) -> Result<Option<CompanyEnrichment>> {
        let conn = self.db.connect()?;
        CompanyRepository::get_latest_enrichment(&conn, company_id).await
    }
    async fn get_enrichments_by_company(
        &self,
        company_id: &str,
    ) -> Result<Vec<CompanyEnrichment>> {
        let conn = self.db.connect()?;
        CompanyRepository::get_enrichments_by_company(&conn, company_id).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}
