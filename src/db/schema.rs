use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Cards table
        CREATE TABLE IF NOT EXISTS cards (
            id TEXT PRIMARY KEY,
            name TEXT,
            title TEXT,
            company TEXT,
            email TEXT,
            phone TEXT,
            website TEXT,
            address TEXT,
            notes TEXT,
            tags TEXT DEFAULT '[]',
            image_url TEXT,
            thumbnail_url TEXT,
            web_image_url TEXT,
            ocr_text TEXT,
            ocr_confidence REAL,
            source TEXT NOT NULL DEFAULT 'manual',
            company_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (company_id) REFERENCES companies(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cards_email ON cards(email);
        CREATE INDEX IF NOT EXISTS idx_cards_company ON cards(company);
        CREATE INDEX IF NOT EXISTS idx_cards_created_at ON cards(created_at);

        -- OCR jobs linking cards to async text extraction work
        CREATE TABLE IF NOT EXISTS ocr_jobs (
            id TEXT PRIMARY KEY,
            card_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'queued',
            image_key TEXT,
            raw_text TEXT,
            fields TEXT,
            confidence REAL,
            error_message TEXT,
            retry_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            completed_at TEXT,
            FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_ocr_jobs_card_id ON ocr_jobs(card_id);
        CREATE INDEX IF NOT EXISTS idx_ocr_jobs_status ON ocr_jobs(status);

        -- Companies deduplicated by domain (or name when no domain is known)
        CREATE TABLE IF NOT EXISTS companies (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            domain TEXT,
            website TEXT,
            industry TEXT,
            description TEXT,
            size TEXT,
            location TEXT,
            confidence REAL,
            enriched_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_companies_domain
            ON companies(domain) WHERE domain IS NOT NULL;
        CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name COLLATE NOCASE);

        -- Per-source enrichment attempts with status and error tracking
        CREATE TABLE IF NOT EXISTS company_enrichments (
            id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL,
            provider TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            payload TEXT,
            confidence REAL,
            error_message TEXT,
            retry_count INTEGER NOT NULL DEFAULT 0,
            fetched_at TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (company_id) REFERENCES companies(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_company_enrichments_company_id
            ON company_enrichments(company_id);
        CREATE INDEX IF NOT EXISTS idx_company_enrichments_created_at
            ON company_enrichments(created_at);
        "#,
    )
    .await?;

    Ok(())
}
