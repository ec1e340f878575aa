use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;

use rolo::api::{create_router, AppState};
use rolo::config::Config;
use rolo::db::{Database, DatabaseBackend, LibSqlBackend};
use rolo::enrichment::EnrichmentProvider;
use rolo::ocr::OcrProvider;
use rolo::storage::StorageProvider;

#[derive(Parser)]
#[command(name = "rolo")]
#[command(about = "Self-hostable business card digitization and enrichment backend")]
struct Args {
    /// Run one OCR sweep for queued jobs and exit
    #[arg(long)]
    process_pending: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rolo=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "ROLO_API_KEYS is not set — protected endpoints are locked. Set ROLO_API_KEYS to enable access."
        );
    }

    tracing::info!("Initializing database...");
    let raw_db = Database::new(&config.database).await?;
    let db_backend = LibSqlBackend::new(raw_db);
    // Wrap in Arc<dyn DatabaseBackend> immediately so we can clone it
    let db: Arc<dyn DatabaseBackend> = Arc::new(db_backend);

    tracing::info!("Initializing OCR provider: {}...", config.ocr.model);
    let ocr = OcrProvider::new(&config.ocr)?;
    if !ocr.is_available() {
        tracing::warn!("OCR unavailable - scanned cards will not be auto-filled");
    }

    tracing::info!("Initializing storage backend: {}...", config.storage.backend);
    let storage = StorageProvider::new(&config.storage)?;
    if !storage.is_available() {
        tracing::warn!("Storage unavailable - uploads and scans will be rejected");
    }

    if let Some(enrichment_config) = &config.enrichment {
        tracing::info!(
            "Initializing enrichment provider: {}...",
            enrichment_config.model
        );
    }
    let enrichment = EnrichmentProvider::new(config.enrichment.as_ref());
    if !enrichment.is_available() {
        tracing::warn!("Enrichment unavailable - company research endpoints are disabled");
    }

    let state = AppState::new(config.clone(), db, ocr, storage, enrichment);

    if args.process_pending {
        tracing::info!("Processing queued OCR jobs...");
        state.pipeline.process_pending().await?;
        return Ok(());
    }

    let cancel_token = CancellationToken::new();

    tracing::info!("Starting OCR job worker...");
    let pipeline = state.pipeline.clone();
    let token = cancel_token.child_token();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("OCR job worker shutting down...");
                    break;
                }
                _ = tokio::time::sleep(tokio::time::Duration::from_secs(10)) => {
                    if let Err(e) = pipeline.process_pending().await {
                        tracing::error!("OCR job worker error: {}", e);
                    }
                }
            }
        }
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Rolo starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}
