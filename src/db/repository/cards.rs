use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{Card, CardSource, CardSummary, ListCardsRequest, Pagination};

pub struct CardRepository;

impl CardRepository {
    pub async fn create(conn: &Connection, card: &Card) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO cards (
                id, name, title, company, email, phone, website, address, notes,
                tags, image_url, thumbnail_url, web_image_url, ocr_text,
                ocr_confidence, source, company_id, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
            )
            "#,
            params![
                card.id.clone(),
                card.name.clone(),
                card.title.clone(),
                card.company.clone(),
                card.email.clone(),
                card.phone.clone(),
                card.website.clone(),
                card.address.clone(),
                card.notes.clone(),
                serde_json::to_string(&card.tags)?,
                card.image_url.clone(),
                card.thumbnail_url.clone(),
                card.web_image_url.clone(),
                card.ocr_text.clone(),
                card.ocr_confidence.map(|c| c as f64),
                card.source.to_string(),
                card.company_id.clone(),
                card.created_at.to_rfc3339(),
                card.updated_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Card>> {
        let mut rows = conn
            .query("SELECT * FROM cards WHERE id = ?1", params![id])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_card(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn update(conn: &Connection, card: &Card) -> Result<()> {
        conn.execute(
            r#"
            UPDATE cards SET
                name = ?2,
                title = ?3,
                company = ?4,
                email = ?5,
                phone = ?6,
                website = ?7,
                address = ?8,
                notes = ?9,
                tags = ?10,
                image_url = ?11,
                thumbnail_url = ?12,
                web_image_url = ?13,
                ocr_text = ?14,
                ocr_confidence = ?15,
                company_id = ?16,
                updated_at = ?17
            WHERE id = ?1
            "#,
            params![
                card.id.clone(),
                card.name.clone(),
                card.title.clone(),
                card.company.clone(),
                card.email.clone(),
                card.phone.clone(),
                card.website.clone(),
                card.address.clone(),
                card.notes.clone(),
                serde_json::to_string(&card.tags)?,
                card.image_url.clone(),
                card.thumbnail_url.clone(),
                card.web_image_url.clone(),
                card.ocr_text.clone(),
                card.ocr_confidence.map(|c| c as f64),
                card.company_id.clone(),
                card.updated_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn delete(conn: &Connection, id: &str) -> Result<bool> {
        // foreign_keys is off on pooled connections, so dependent jobs are
        // removed explicitly rather than via the schema's ON DELETE CASCADE.
        conn.execute("DELETE FROM ocr_jobs WHERE card_id = ?1", params![id])
            .await?;
        let rows_affected = conn
            .execute("DELETE FROM cards WHERE id = ?1", params![id])
            .await?;

        Ok(rows_affected > 0)
    }

    pub async fn list(
        conn: &Connection,
        req: &ListCardsRequest,
    ) -> Result<(Vec<CardSummary>, Pagination)> {
        let limit = req.limit.unwrap_or(20).clamp(1, 100);
        let page = req.page.unwrap_or(1).max(1);
        let offset = (page - 1) * limit;
        let order = req.order.as_deref().unwrap_or("desc");
        let sort = req.sort.as_deref().unwrap_or("created_at");

        let order_clause = format!(
            "ORDER BY {} {}",
            match sort {
                "updated_at" => "updated_at",
                "name" => "name",
                _ => "created_at",
            },
            match order {
                "asc" => "ASC",
                _ => "DESC",
            }
        );

        let mut where_clauses = Vec::new();
        let mut query_params: Vec<libsql::Value> = Vec::new();

        if let Some(ref q) = req.q {
            let q = q.trim();
            if !q.is_empty() {
                let pattern = format!("%{q}%");
                let start = query_params.len() + 1;
                where_clauses.push(format!(
                    "(name LIKE ?{p1} OR company LIKE ?{p2} OR email LIKE ?{p3} \
                     OR notes LIKE ?{p4} OR ocr_text LIKE ?{p5})",
                    p1 = start,
                    p2 = start + 1,
                    p3 = start + 2,
                    p4 = start + 3,
                    p5 = start + 4,
                ));
                for _ in 0..5 {
                    query_params.push(libsql::Value::from(pattern.clone()));
                }
            }
        }

        if let Some(ref tags) = req.tags {
            for tag in tags {
                let idx = query_params.len() + 1;
                where_clauses.push(format!("tags LIKE ?{idx}"));
                query_params.push(libsql::Value::from(format!("%\"{tag}\"%")));
            }
        }

        let where_clause = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM cards {where_clause}");
        let mut count_rows = conn
            .query(&count_sql, libsql::params_from_iter(query_params.clone()))
            .await?;
        let total_items: u32 = match count_rows.next().await? {
            Some(row) => row.get::<i64>(0)? as u32,
            None => 0,
        };

        let sql = format!(
            "SELECT * FROM cards {where_clause} {order_clause} LIMIT {limit} OFFSET {offset}"
        );
        let mut rows = conn
            .query(&sql, libsql::params_from_iter(query_params))
            .await?;

        let mut cards = Vec::new();
        while let Some(row) = rows.next().await? {
            cards.push(Self::row_to_card(&row)?.into());
        }

        Ok((cards, Pagination::new(page, limit, total_items)))
    }

    fn row_to_card(row: &libsql::Row) -> Result<Card> {
        Ok(Card {
            id: row.get(0)?,
            name: row.get(1)?,
            title: row.get(2)?,
            company: row.get(3)?,
            email: row.get(4)?,
            phone: row.get(5)?,
            website: row.get(6)?,
            address: row.get(7)?,
            notes: row.get(8)?,
            tags: serde_json::from_str(&row.get::<String>(9)?).unwrap_or_default(),
            image_url: row.get(10)?,
            thumbnail_url: row.get(11)?,
            web_image_url: row.get(12)?,
            ocr_text: row.get(13)?,
            ocr_confidence: row.get::<Option<f64>>(14)?.map(|c| c as f32),
            source: row
                .get::<String>(15)?
                .parse()
                .unwrap_or(CardSource::Manual),
            company_id: row.get(16)?,
            created_at: DateTime::parse_from_rfc3339(&row.get::<String>(17)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&row.get::<String>(18)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}
