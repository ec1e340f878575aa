//! HTTP-level upload and scan flow through the full v1 router.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use rolo::api::{create_router, AppState};
use rolo::config::{
    Config, DatabaseConfig, OcrConfig, ServerConfig, StorageConfig, UploadConfig,
};
use rolo::db::{Database, DatabaseBackend, LibSqlBackend};
use rolo::enrichment::EnrichmentProvider;
use rolo::ocr::OcrProvider;
use rolo::storage::StorageProvider;

const BOUNDARY: &str = "----RoloUploadTestBoundary";
const API_KEY: &str = "upload-test-key";

async fn test_app(storage_root: &str) -> axum::Router {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_keys: vec![API_KEY.to_string()],
            rate_limit_per_minute: None,
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
            auth_token: None,
            local_path: None,
        },
        upload: UploadConfig {
            max_file_size: 10 * 1024 * 1024,
            max_image_dimension: 8000,
            min_image_dimension: 100,
            max_aspect_ratio: 4.0,
        },
        ocr: OcrConfig {
            model: "local/tesseract".to_string(),
            api_key: None,
            base_url: None,
            languages: "eng".to_string(),
            timeout_secs: 60,
            max_image_dimension: 4096,
            min_image_dimension: 50,
            confidence_threshold: 0.7,
        },
        storage: StorageConfig {
            backend: "local".to_string(),
            bucket: "cards".to_string(),
            region: None,
            base_url: None,
            api_key: None,
            cdn_domain: None,
            local_root: storage_root.to_string(),
        },
        enrichment: None,
    };

    let db = Database::new(&config.database).await.expect("db");
    let db: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(db));
    let ocr = OcrProvider::new(&config.ocr).expect("ocr");
    let storage = StorageProvider::new(&config.storage).expect("storage");
    let enrichment = EnrichmentProvider::new(config.enrichment.as_ref());

    create_router(AppState::new(config, db, ocr, storage, enrichment))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {API_KEY}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn upload_stores_image_and_reports_variants() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path().to_str().unwrap()).await;

    let png = common::test_card_png(1400, 900);
    let body = common::multipart_body(
        BOUNDARY,
        &[("image", Some("card-front.png"), Some("image/png"), &png)],
    );

    let response = app
        .oneshot(multipart_request("/api/v1/upload", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["success"], true);
    let images = json["data"]["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["fileName"], "card-front.png");
    assert_eq!(images[0]["width"], 1400);
    assert_eq!(images[0]["height"], 900);
    let aspect_ratio = images[0]["aspectRatio"].as_f64().unwrap();
    assert!((aspect_ratio - 1.56).abs() < 1e-3);

    let variants = images[0]["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 4);
    assert!(json["data"]["failures"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn upload_reports_per_file_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path().to_str().unwrap()).await;

    let good = common::test_card_png(1200, 800);
    let body = common::multipart_body(
        BOUNDARY,
        &[
            ("images", Some("good.png"), Some("image/png"), &good),
            (
                "images",
                Some("bad.txt"),
                Some("text/plain"),
                b"definitely not an image",
            ),
        ],
    );

    let response = app
        .oneshot(multipart_request("/api/v1/upload", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["data"]["images"].as_array().unwrap().len(), 1);
    let failures = json["data"]["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["fileName"], "bad.txt");
    assert!(failures[0]["error"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn upload_without_file_part_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path().to_str().unwrap()).await;

    let body = common::multipart_body(BOUNDARY, &[("notes", None, None, b"no file here")]);

    let response = app
        .oneshot(multipart_request("/api/v1/upload", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn scan_returns_accepted_card_and_job() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path().to_str().unwrap()).await;

    let png = common::test_card_png(1200, 750);
    let body = common::multipart_body(
        BOUNDARY,
        &[
            ("image", Some("card.png"), Some("image/png"), &png),
            ("tags", None, None, b"expo, berlin"),
            ("notes", None, None, b"booth 42"),
        ],
    );

    let response = app
        .clone()
        .oneshot(multipart_request("/api/v1/scan", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;

    assert_eq!(json["success"], true);
    let card = &json["data"]["card"];
    assert_eq!(card["source"], "scan");
    assert_eq!(card["tags"], serde_json::json!(["expo", "berlin"]));
    assert_eq!(card["notes"], "booth 42");
    assert!(card["thumbnailUrl"].is_string());

    let job = &json["data"]["job"];
    assert_eq!(job["cardId"], card["cardId"]);
    assert!(job["jobId"].is_string());

    // The job is visible through the polling endpoint right away.
    let job_id = job["jobId"].as_str().unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/scan/{job_id}"))
                .header("Authorization", format!("Bearer {API_KEY}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let status = json["data"]["status"].as_str().unwrap();
    assert!(
        ["queued", "processing", "completed", "failed"].contains(&status),
        "unexpected job status: {status}"
    );
}

#[tokio::test]
async fn scan_with_two_images_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path().to_str().unwrap()).await;

    let png = common::test_card_png(1200, 750);
    let body = common::multipart_body(
        BOUNDARY,
        &[
            ("image", Some("a.png"), Some("image/png"), &png),
            ("image", Some("b.png"), Some("image/png"), &png),
        ],
    );

    let response = app
        .oneshot(multipart_request("/api/v1/scan", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("exactly one image"));
}
