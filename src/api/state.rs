use std::sync::Arc;

use crate::api::v1::middleware::RateLimiter;
use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::enrichment::{EnrichmentProvider, EnrichmentService};
use crate::ocr::OcrProvider;
use crate::services::ScanPipeline;
use crate::storage::StorageProvider;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub pipeline: ScanPipeline,
    pub enrichment: Arc<EnrichmentService>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<dyn DatabaseBackend>,
        ocr: OcrProvider,
        storage: StorageProvider,
        enrichment_provider: EnrichmentProvider,
    ) -> Self {
        let config = Arc::new(config);
        let pipeline = ScanPipeline::new(db.clone(), ocr, storage, &config);
        let enrichment = Arc::new(EnrichmentService::new(db.clone(), enrichment_provider));

        Self {
            config,
            db,
            pipeline,
            enrichment,
            rate_limiter: Arc::new(RateLimiter::default()),
        }
    }
}
