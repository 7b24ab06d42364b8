//! Asset Gateway
//!
//! Issues time-limited upload URLs for an object-storage bucket, records
//! metadata about completed uploads in PostgreSQL, and resolves stored
//! objects to public-facing URLs.

use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

mod api;
mod asset;
mod config;
mod db;
mod storage;

use crate::asset::AssetService;
use crate::config::Settings;
use crate::db::{AssetRepository, DbPool, PgAssetRepository};
use crate::storage::create_storage_provider;

/// Application state shared across all handlers
pub struct AppState {
    pub asset_service: Arc<AssetService>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("asset_gateway=info".parse().unwrap())
                .add_directive("actix_web=info".parse().unwrap()),
        )
        .json()
        .init();

    // Load configuration; invalid values (pool sizing, timeouts) abort here
    let settings = Settings::load().expect("Failed to load configuration");
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);

    info!(
        "Starting Asset Gateway v{} on {} (storage provider: {})",
        env!("CARGO_PKG_VERSION"),
        bind_addr,
        settings.storage.provider
    );

    // Provider misconfiguration (missing bucket/credentials) is fatal at startup
    let storage =
        create_storage_provider(&settings).expect("Failed to initialize storage provider");

    // Initialize database connection if database.url is configured
    let repository: Option<Arc<dyn AssetRepository>> = if !settings.database.url.is_empty() {
        match DbPool::new(&settings.database) {
            Ok(pool) => {
                if let Err(e) = pool.test_connection().await {
                    tracing::warn!(
                        "Database connection test failed: {}. Running without persistence.",
                        e
                    );
                    None
                } else {
                    if let Err(e) = pool.warm(settings.database.pool_min_size).await {
                        tracing::warn!("Database pool warm-up failed: {}", e);
                    }
                    info!("Database pool initialized successfully");
                    Some(Arc::new(PgAssetRepository::new(pool)))
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to create database pool: {}. Running without persistence.",
                    e
                );
                None
            }
        }
    } else {
        info!("No database.url configured, running without persistence");
        None
    };

    let asset_service = Arc::new(AssetService::new(
        settings.storage.asset_base_url.clone(),
        storage,
        repository,
    ));

    // Create shared application state
    let app_state = web::Data::new(AppState { asset_service });

    let workers = settings.server.workers.unwrap_or_else(|| num_cpus::get() * 2);

    // Configure and start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Service", "asset-gateway"))
                    .add(("X-Version", env!("CARGO_PKG_VERSION"))),
            )
            .configure(api::configure_routes)
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
