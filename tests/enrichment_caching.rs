//! Freshness-window and merge behavior of the enrichment service against a
//! mocked OpenAI-compatible research endpoint.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rolo::config::{DatabaseConfig, EnrichmentConfig};
use rolo::db::{Database, DatabaseBackend, LibSqlBackend};
use rolo::enrichment::{EnrichRequest, EnrichmentProvider, EnrichmentService};
use rolo::error::RoloError;
use rolo::models::EnrichmentStatus;

async fn memory_db() -> Arc<dyn DatabaseBackend> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
        auth_token: None,
        local_path: None,
    };
    let db = Database::new(&config).await.expect("in-memory database");
    Arc::new(LibSqlBackend::new(db))
}

fn enrichment_config(base_url: String) -> EnrichmentConfig {
    EnrichmentConfig {
        model: "openai/gpt-4o-mini".to_string(),
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url),
        timeout_secs: 5,
        max_retries: 0,
        freshness_days: 30,
        rate_limit_per_minute: 100,
    }
}

fn completion_body(profile: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": profile.to_string()
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

fn tech_corp_profile() -> serde_json::Value {
    json!({
        "name": "Tech Corp",
        "domain": "techcorp.com",
        "website": "https://techcorp.com",
        "industry": "Software",
        "description": "Developer tooling vendor",
        "size": "51-200",
        "location": "Austin, TX",
        "confidence": 0.85
    })
}

#[tokio::test]
async fn second_enrich_within_freshness_window_hits_cache() {
    let server = MockServer::start().await;

    // Exactly one upstream call is allowed; the second enrich must be
    // answered from the freshness cache.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            tech_corp_profile(),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let db = memory_db().await;
    let provider = EnrichmentProvider::new(Some(&enrichment_config(server.uri())));
    let service = EnrichmentService::new(db.clone(), provider);

    let request = EnrichRequest {
        name: Some("Tech Corp".to_string()),
        domain: Some("techcorp.com".to_string()),
        force_refresh: false,
    };

    let first = service.enrich(&request).await.expect("first enrich");
    assert!(first.refreshed);
    assert_eq!(first.company.industry.as_deref(), Some("Software"));
    assert!(first.company.enriched_at.is_some());
    let first_enrichment = first.enrichment.expect("enrichment row");
    assert_eq!(first_enrichment.status, EnrichmentStatus::Completed);

    let second = service.enrich(&request).await.expect("second enrich");
    assert!(!second.refreshed, "within the window the cache answers");
    assert_eq!(second.company.id, first.company.id);
    assert_eq!(
        second.enrichment.expect("cached enrichment row").id,
        first_enrichment.id,
        "the latest recorded attempt is returned, not a new one"
    );

    server.verify().await;
}

#[tokio::test]
async fn force_refresh_re_fetches_and_merges_last_write_wins() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            tech_corp_profile(),
        )))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    let updated_profile = json!({
        "name": "Tech Corp",
        "domain": "techcorp.com",
        "website": null,
        "industry": "Developer Tools",
        "description": null,
        "size": "201-500",
        "location": null,
        "confidence": 0.9
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(updated_profile)))
        .expect(1)
        .mount(&server)
        .await;

    let db = memory_db().await;
    let provider = EnrichmentProvider::new(Some(&enrichment_config(server.uri())));
    let service = EnrichmentService::new(db.clone(), provider);

    let request = EnrichRequest {
        name: Some("Tech Corp".to_string()),
        domain: Some("techcorp.com".to_string()),
        force_refresh: false,
    };
    let first = service.enrich(&request).await.expect("first enrich");
    assert_eq!(first.company.size.as_deref(), Some("51-200"));

    let refresh = EnrichRequest {
        force_refresh: true,
        ..request
    };
    let second = service.enrich(&refresh).await.expect("forced refresh");

    assert!(second.refreshed);
    assert_eq!(second.company.id, first.company.id, "same deduped company");
    // Newer non-null fields win ...
    assert_eq!(second.company.industry.as_deref(), Some("Developer Tools"));
    assert_eq!(second.company.size.as_deref(), Some("201-500"));
    assert_eq!(second.company.confidence, Some(0.9));
    // ... while null fields keep the previous values.
    assert_eq!(
        second.company.website.as_deref(),
        Some("https://techcorp.com")
    );
    assert_eq!(second.company.location.as_deref(), Some("Austin, TX"));

    // Both attempts are recorded.
    let history = db
        .get_enrichments_by_company(&first.company.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 2);

    server.verify().await;
}

#[tokio::test]
async fn failed_enrichment_records_a_failure_row() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "model does not exist",
                "type": "invalid_request_error",
                "param": null,
                "code": "model_not_found"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = memory_db().await;
    let provider = EnrichmentProvider::new(Some(&enrichment_config(server.uri())));
    let service = EnrichmentService::new(db.clone(), provider);

    let request = EnrichRequest {
        name: Some("Ghost Co".to_string()),
        domain: None,
        force_refresh: false,
    };

    let err = service.enrich(&request).await.expect_err("should fail");
    assert!(matches!(err, RoloError::Enrichment(_)));

    let company = db
        .get_company_by_name("Ghost Co")
        .await
        .expect("lookup")
        .expect("shell company was created");
    assert!(company.enriched_at.is_none(), "failure does not stamp freshness");

    let history = db
        .get_enrichments_by_company(&company.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, EnrichmentStatus::Failed);
    assert!(history[0].error_message.is_some());
}

#[tokio::test]
async fn enrich_requires_name_or_domain() {
    let db = memory_db().await;
    let provider = EnrichmentProvider::new(None);
    let service = EnrichmentService::new(db, provider);

    let err = service
        .enrich(&EnrichRequest::default())
        .await
        .expect_err("empty request");
    assert!(matches!(err, RoloError::Validation(_)));
}
