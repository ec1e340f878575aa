use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{Company, CompanyEnrichment, EnrichmentStatus, Pagination};

pub struct CompanyRepository;

impl CompanyRepository {
    pub async fn create(conn: &Connection, company: &Company) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO companies (
                id, name, domain, website, industry, description, size, location,
                confidence, enriched_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                company.id.clone(),
                company.name.clone(),
                company.domain.clone(),
                company.website.clone(),
                company.industry.clone(),
                company.description.clone(),
                company.size.clone(),
                company.location.clone(),
                company.confidence.map(|c| c as f64),
                company.enriched_at.map(|t| t.to_rfc3339()),
                company.created_at.to_rfc3339(),
                company.updated_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Company>> {
        let mut rows = conn
            .query("SELECT * FROM companies WHERE id = ?1", params![id])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_company(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn get_by_domain(conn: &Connection, domain: &str) -> Result<Option<Company>> {
        let mut rows = conn
            .query("SELECT * FROM companies WHERE domain = ?1", params![domain])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_company(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Company>> {
        let mut rows = conn
            .query(
                "SELECT * FROM companies WHERE name = ?1 COLLATE NOCASE",
                params![name],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_company(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn update(conn: &Connection, company: &Company) -> Result<()> {
        conn.execute(
            r#"
            UPDATE companies SET
                name = ?2,
                domain = ?3,
                website = ?4,
                industry = ?5,
                description = ?6,
                size = ?7,
                location = ?8,
                confidence = ?9,
                enriched_at = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
            params![
                company.id.clone(),
                company.name.clone(),
                company.domain.clone(),
                company.website.clone(),
                company.industry.clone(),
                company.description.clone(),
                company.size.clone(),
                company.location.clone(),
                company.confidence.map(|c| c as f64),
                company.enriched_at.map(|t| t.to_rfc3339()),
                company.updated_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn list(
        conn: &Connection,
        limit: u32,
        page: u32,
    ) -> Result<(Vec<Company>, Pagination)> {
        let limit = limit.clamp(1, 100);
        let page = page.max(1);
        let offset = (page - 1) * limit;

        let mut count_rows = conn.query("SELECT COUNT(*) FROM companies", ()).await?;
        let total_items: u32 = match count_rows.next().await? {
            Some(row) => row.get::<i64>(0)? as u32,
            None => 0,
        };

        let mut rows = conn
            .query(
                "SELECT * FROM companies ORDER BY name ASC LIMIT ?1 OFFSET ?2",
                params![limit as i64, offset as i64],
            )
            .await?;

        let mut companies = Vec::new();
        while let Some(row) = rows.next().await? {
            companies.push(Self::row_to_company(&row)?);
        }

        Ok((companies, Pagination::new(page, limit, total_items)))
    }

    pub async fn create_enrichment(
        conn: &Connection,
        enrichment: &CompanyEnrichment,
    ) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO company_enrichments (
                id, company_id, provider, status, payload, confidence,
                error_message, retry_count, fetched_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                enrichment.id.clone(),
                enrichment.company_id.clone(),
                enrichment.provider.clone(),
                enrichment.status.to_string(),
                enrichment
                    .payload
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                enrichment.confidence.map(|c| c as f64),
                enrichment.error_message.clone(),
                enrichment.retry_count,
                enrichment.fetched_at.map(|t| t.to_rfc3339()),
                enrichment.created_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_latest_enrichment(
        conn: &Connection,
        company_id: &str,
    ) -> Result<Option<CompanyEnrichment>> {
        let mut rows = conn
            .query(
                r#"
                SELECT * FROM company_enrichments
                WHERE company_id = ?1
                ORDER BY created_at DESC
                LIMIT 1
                "#,
                params![company_id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_enrichment(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn get_enrichments_by_company(
        conn: &Connection,
        company_id: &str,
    ) -> Result<Vec<CompanyEnrichment>> {
        let mut rows = conn
            .query(
                r#"
                SELECT * FROM company_enrichments
                WHERE company_id = ?1
                ORDER BY created_at DESC
                "#,
                params![company_id],
            )
            .await?;

        let mut enrichments = Vec::new();
        while let Some(row) = rows.next().await? {
            enrichments.push(Self::row_to_enrichment(&row)?);
        }
        Ok(enrichments)
    }

    fn row_to_company(row: &libsql::Row) -> Result<Company> {
        Ok(Company {
            id: row.get(0)?,
            name: row.get(1)?,
            domain: row.get(2)?,
            website: row.get(3)?,
            industry: row.get(4)?,
            description: row.get(5)?,
            size: row.get(6)?,
            location: row.get(7)?,
            confidence: row.get::<Option<f64>>(8)?.map(|c| c as f32),
            enriched_at: row
                .get::<Option<String>>(9)?
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            created_at: DateTime::parse_from_rfc3339(&row.get::<String>(10)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&row.get::<String>(11)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    fn row_to_enrichment(row: &libsql::Row) -> Result<CompanyEnrichment> {
        Ok(CompanyEnrichment {
            id: row.get(0)?,
            company_id: row.get(1)?,
            provider: row.get(2)?,
            status: row
                .get::<String>(3)?
                .parse()
                .unwrap_or(EnrichmentStatus::Pending),
            payload: row
                .get::<Option<String>>(4)?
                .and_then(|s| serde_json::from_str(&s).ok()),
            confidence: row.get::<Option<f64>>(5)?.map(|c| c as f32),
            error_message: row.get(6)?,
            retry_count: row.get(7)?,
            fetched_at: row
                .get::<Option<String>>(8)?
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            created_at: DateTime::parse_from_rfc3339(&row.get::<String>(9)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}
