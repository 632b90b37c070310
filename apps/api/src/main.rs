mod company;
mod config;
mod db;
mod errors;
mod models;
mod offer;
mod pdf;
mod pipeline;
mod responses;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::{Config, DataSource};
use crate::db::create_pool;
use crate::offer::session::SessionRegistry;
use crate::pdf::{HttpPdfRenderer, PdfArchive};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{HrStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting OfferDesk API v{}", env!("CARGO_PKG_VERSION"));

    // Data source is chosen once, here
    let store: Arc<dyn HrStore> = match config.data_source {
        DataSource::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required when DATA_SOURCE=postgres")?;
            Arc::new(PgStore::new(create_pool(database_url).await?))
        }
        DataSource::Memory => {
            info!("Using seeded in-memory data source");
            Arc::new(MemoryStore::seeded())
        }
    };

    let renderer = Arc::new(HttpPdfRenderer::new(&config.pdf_renderer_url)?);
    info!("PDF renderer at {}", config.pdf_renderer_url);

    let archive = match &config.s3 {
        Some(settings) => {
            let archive = PdfArchive::connect(settings).await;
            info!("S3 archive enabled (bucket: {})", settings.bucket);
            Some(archive)
        }
        None => {
            info!("S3 not configured; rendered PDFs will not be archived");
            None
        }
    };

    let state = AppState {
        store,
        sessions: SessionRegistry::default(),
        renderer,
        archive,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the admin console host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
