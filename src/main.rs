//! KTP OCR API
//!
//! Extracts structured data from Indonesian identity cards (KTP) using
//! Google Cloud Vision with a PaddleOCR fallback, and isolates handwritten
//! signatures into transparent PNGs published to a CDN.

use actix_web::{web, App, HttpServer, middleware};
use anyhow::Context;
use std::time::Instant;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod domain;
mod engine;
mod providers;
mod storage;

use crate::config::Settings;
use crate::engine::{KtpExtractor, SignatureService};
use crate::providers::SmartOcr;
use crate::storage::CdnClient;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    pub ocr: SmartOcr,
    pub ktp_extractor: KtpExtractor,
    pub signature_service: SignatureService,
    pub started_at: Instant,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ktp_ocr_api=info,actix_web=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);

    info!(
        "Starting KTP OCR API v{} on {}",
        env!("CARGO_PKG_VERSION"),
        bind_addr
    );

    tokio::fs::create_dir_all(&settings.upload.temp_dir)
        .await
        .with_context(|| format!("Failed to create temp dir {}", settings.upload.temp_dir.display()))?;

    let ocr = SmartOcr::from_settings(&settings.ocr);

    let cdn = CdnClient::new(&settings.cdn).context("Failed to initialize CDN client")?;
    if !cdn.is_configured() {
        warn!("CDN_BASE_URL not configured, signature uploads will fail");
    }

    let workers = settings.server.workers.unwrap_or_else(|| num_cpus::get() * 2);

    // Create shared application state
    let app_state = web::Data::new(AppState {
        settings,
        ocr,
        ktp_extractor: KtpExtractor::new(),
        signature_service: SignatureService::new(cdn),
        started_at: Instant::now(),
    });

    // Configure and start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Service", "ktp-ocr-api"))
                    .add(("X-Version", env!("CARGO_PKG_VERSION")))
            )
            .configure(api::configure_routes)
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
