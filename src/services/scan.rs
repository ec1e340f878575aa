use std::sync::Arc;

use chrono::Utc;
use nanoid::nanoid;

use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::error::{Result, RoloError};
use crate::extraction;
use crate::imaging::{self, Variant, VariantKind};
use crate::models::{Card, CardSource, OcrJob, OcrJobStatus};
use crate::ocr::OcrProvider;
use crate::storage::StorageProvider;

/// Failed jobs are re-attempted by the background sweep at most this many
/// times before they stay failed.
const MAX_JOB_RETRIES: i32 = 3;

/// How many queued jobs one sweep picks up.
const SWEEP_BATCH_SIZE: u32 = 10;

/// One stored derivative of an upload.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredVariant {
    pub kind: VariantKind,
    pub key: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

/// A fully ingested upload: validation result plus stored derivatives.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f32,
    pub variants: Vec<StoredVariant>,
}

impl StoredUpload {
    pub fn variant_url(&self, kind: VariantKind) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.kind == kind)
            .map(|v| v.url.as_str())
    }

    fn variant_key(&self, kind: VariantKind) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.kind == kind)
            .map(|v| v.key.as_str())
    }
}

/// Orchestrates the upload/scan path: validate, derive variants, store,
/// persist the card, and hand the image off to the async OCR worker.
///
/// Card and job rows are written sequentially and independently; a failed
/// OCR run leaves a valid card with empty contact fields and a failed job
/// row rather than rolling anything back.
pub struct ScanPipeline {
    db: Arc<dyn DatabaseBackend>,
    ocr: OcrProvider,
    storage: StorageProvider,
    upload_config: crate::config::UploadConfig,
    confidence_threshold: f32,
}

impl ScanPipeline {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        ocr: OcrProvider,
        storage: StorageProvider,
        config: &Config,
    ) -> Self {
        Self {
            db,
            ocr,
            storage,
            upload_config: config.upload.clone(),
            confidence_threshold: config.ocr.confidence_threshold,
        }
    }

    pub fn ocr_available(&self) -> bool {
        self.ocr.is_available()
    }

    pub fn storage_available(&self) -> bool {
        self.storage.is_available()
    }

    pub fn storage(&self) -> &StorageProvider {
        &self.storage
    }

    /// Validate an upload, generate derivatives, and store them under the
    /// given key prefix. Individual variant failures are tolerated as long
    /// as at least one derivative lands in storage.
    pub async fn ingest(&self, bytes: &[u8], key_prefix: &str) -> Result<StoredUpload> {
        let validated = imaging::validate(bytes, &self.upload_config)?;
        let variants = imaging::generate(bytes)?;

        let mut stored = Vec::with_capacity(variants.len());
        for variant in &variants {
            match self.store_variant(key_prefix, variant).await {
                Ok(v) => stored.push(v),
                Err(e) => {
                    tracing::warn!(
                        kind = %variant.kind,
                        error = %e,
                        "Failed to store image variant"
                    );
                }
            }
        }

        if stored.is_empty() {
            return Err(RoloError::Storage(
                "No image variant could be stored".to_string(),
            ));
        }

        Ok(StoredUpload {
            id: key_prefix
                .rsplit('/')
                .next()
                .unwrap_or(key_prefix)
                .to_string(),
            width: validated.width,
            height: validated.height,
            aspect_ratio: validated.aspect_ratio,
            variants: stored,
        })
    }

    async fn store_variant(&self, key_prefix: &str, variant: &Variant) -> Result<StoredVariant> {
        let key = format!(
            "{key_prefix}/{}.{}",
            variant.kind,
            variant.kind.file_extension()
        );
        let object = self
            .storage
            .put(&key, &variant.bytes, variant.content_type)
            .await?;

        Ok(StoredVariant {
            kind: variant.kind,
            key: object.key,
            url: object.url,
            width: variant.width,
            height: variant.height,
            size_bytes: variant.bytes.len() as u64,
        })
    }

    /// Create a card from an uploaded image and queue its OCR job.
    pub async fn scan(
        &self,
        bytes: &[u8],
        tags: Vec<String>,
        notes: Option<String>,
    ) -> Result<(Card, OcrJob)> {
        let card_id = nanoid!();
        let upload = self.ingest(bytes, &format!("cards/{card_id}")).await?;

        let mut card = Card::new(card_id.clone());
        card.source = CardSource::Scan;
        card.tags = tags;
        card.notes = notes;
        card.image_url = upload
            .variant_url(VariantKind::Storage)
            .map(String::from);
        card.thumbnail_url = upload
            .variant_url(VariantKind::Thumbnail)
            .map(String::from);
        card.web_image_url = upload.variant_url(VariantKind::Web).map(String::from);
        self.db.create_card(&card).await?;

        let mut job = OcrJob::new(nanoid!(), card_id);
        // Fall back to the archival copy when the OCR derivative failed.
        job.image_key = upload
            .variant_key(VariantKind::Ocr)
            .or_else(|| upload.variant_key(VariantKind::Storage))
            .map(String::from);
        self.db.create_ocr_job(&job).await?;

        Ok((card, job))
    }

    /// Run OCR and field extraction for one queued job.
    pub async fn process_job(&self, job_id: &str) -> Result<()> {
        let job = self
            .db
            .get_ocr_job_by_id(job_id)
            .await?
            .ok_or_else(|| RoloError::NotFound(format!("OCR job {job_id} not found")))?;

        let image_key = match job.image_key.as_deref() {
            Some(key) => key,
            None => {
                self.db
                    .update_ocr_job_status(
                        job_id,
                        OcrJobStatus::Failed,
                        Some("Job has no stored image"),
                    )
                    .await?;
                return Err(RoloError::Ocr("Job has no stored image".to_string()));
            }
        };

        self.db
            .update_ocr_job_status(job_id, OcrJobStatus::Processing, None)
            .await?;

        let result = self.run_ocr(&job, image_key).await;

        if let Err(ref e) = result {
            self.db
                .update_ocr_job_status(job_id, OcrJobStatus::Failed, Some(&e.to_string()))
                .await?;
        }

        result
    }

    async fn run_ocr(&self, job: &OcrJob, image_key: &str) -> Result<()> {
        let bytes = self.storage.get(image_key).await?;
        let output = self.ocr.ocr(&bytes).await?;

        let fields = extraction::extract_fields(&output.lines, self.confidence_threshold);
        let raw_text = extraction::raw_text(&output.lines, self.confidence_threshold);
        let payload = serde_json::to_value(&fields)?;

        self.db
            .complete_ocr_job(&job.id, &raw_text, &payload, fields.confidence)
            .await?;

        let mut card = match self.db.get_card_by_id(&job.card_id).await? {
            Some(card) => card,
            None => {
                // Card deleted while the job was in flight; the job result
                // is still recorded above.
                tracing::warn!(card_id = %job.card_id, "Card gone before OCR completion");
                return Ok(());
            }
        };

        // Fill only fields the user has not already set.
        card.name = card.name.or(fields.name);
        card.title = card.title.or(fields.title);
        card.company = card.company.or(fields.company);
        card.email = card.email.or(fields.email);
        card.phone = card.phone.or(fields.phone);
        card.website = card.website.or(fields.website);
        card.address = card.address.or(fields.address);
        card.ocr_text = Some(raw_text);
        card.ocr_confidence = Some(fields.confidence);
        card.updated_at = Utc::now();
        self.db.update_card(&card).await?;

        tracing::info!(
            job_id = %job.id,
            card_id = %job.card_id,
            confidence = fields.confidence,
            "OCR job completed"
        );

        Ok(())
    }

    /// Sweep for queued jobs left behind by missed spawns or restarts.
    pub async fn process_pending(&self) -> Result<()> {
        let jobs = self
            .db
            .get_queued_ocr_jobs(SWEEP_BATCH_SIZE, MAX_JOB_RETRIES)
            .await?;

        for job in jobs {
            if let Err(e) = self.process_job(&job.id).await {
                tracing::error!(job_id = %job.id, error = %e, "Queued OCR job failed");
            }
        }

        Ok(())
    }
}

impl Clone for ScanPipeline {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            ocr: self.ocr.clone(),
            storage: self.storage.clone(),
            upload_config: self.upload_config.clone(),
            confidence_threshold: self.confidence_threshold,
        }
    }
}
