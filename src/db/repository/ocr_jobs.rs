use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{OcrJob, OcrJobStatus};

pub struct OcrJobRepository;

impl OcrJobRepository {
    pub async fn create(conn: &Connection, job: &OcrJob) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO ocr_jobs (
                id, card_id, status, image_key, raw_text, fields, confidence,
                error_message, retry_count, created_at, updated_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                job.id.clone(),
                job.card_id.clone(),
                job.status.to_string(),
                job.image_key.clone(),
                job.raw_text.clone(),
                job.fields
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                job.confidence.map(|c| c as f64),
                job.error_message.clone(),
                job.retry_count,
                job.created_at.to_rfc3339(),
                job.updated_at.to_rfc3339(),
                job.completed_at.map(|t| t.to_rfc3339()),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<OcrJob>> {
        let mut rows = conn
            .query("SELECT * FROM ocr_jobs WHERE id = ?1", params![id])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_job(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn get_by_card(conn: &Connection, card_id: &str) -> Result<Vec<OcrJob>> {
        let mut rows = conn
            .query(
                "SELECT * FROM ocr_jobs WHERE card_id = ?1 ORDER BY created_at DESC",
                params![card_id],
            )
            .await?;

        let mut jobs = Vec::new();
        while let Some(row) = rows.next().await? {
            jobs.push(Self::row_to_job(&row)?);
        }
        Ok(jobs)
    }

    pub async fn get_queued(
        conn: &Connection,
        limit: u32,
        max_retries: i32,
    ) -> Result<Vec<OcrJob>> {
        let mut rows = conn
            .query(
                r#"
                SELECT * FROM ocr_jobs
                WHERE status = 'queued' AND retry_count < ?1
                ORDER BY created_at ASC
                LIMIT ?2
                "#,
                params![max_retries, limit as i64],
            )
            .await?;

        let mut jobs = Vec::new();
        while let Some(row) = rows.next().await? {
            jobs.push(Self::row_to_job(&row)?);
        }
        Ok(jobs)
    }

    pub async fn update_status(
        conn: &Connection,
        id: &str,
        status: OcrJobStatus,
        error: Option<&str>,
    ) -> Result<()> {
        // Failures bump retry_count so the sweep can cap re-attempts.
        let bump = matches!(status, OcrJobStatus::Failed) as i32;
        conn.execute(
            r#"
            UPDATE ocr_jobs SET
                status = ?2,
                error_message = ?3,
                retry_count = retry_count + ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                id,
                status.to_string(),
                error,
                bump,
                Utc::now().to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn complete(
        conn: &Connection,
        id: &str,
        raw_text: &str,
        fields: &serde_json::Value,
        confidence: f32,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            UPDATE ocr_jobs SET
                status = 'completed',
                raw_text = ?2,
                fields = ?3,
                confidence = ?4,
                error_message = NULL,
                updated_at = ?5,
                completed_at = ?5
            WHERE id = ?1
            "#,
            params![
                id,
                raw_text,
                serde_json::to_string(fields)?,
                confidence as f64,
                now,
            ],
        )
        .await?;

        Ok(())
    }

    fn row_to_job(row: &libsql::Row) -> Result<OcrJob> {
        Ok(OcrJob {
            id: row.get(0)?,
            card_id: row.get(1)?,
            status: row
                .get::<String>(2)?
                .parse()
                .unwrap_or(OcrJobStatus::Queued),
            image_key: row.get(3)?,
            raw_text: row.get(4)?,
            fields: row
                .get::<Option<String>>(5)?
                .and_then(|s| serde_json::from_str(&s).ok()),
            confidence: row.get::<Option<f64>>(6)?.map(|c| c as f32),
            error_message: row.get(7)?,
            retry_count: row.get(8)?,
            created_at: DateTime::parse_from_rfc3339(&row.get::<String>(9)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&row.get::<String>(10)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            completed_at: row
                .get::<Option<String>>(11)?
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }
}
