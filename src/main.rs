// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! NutriGram API Server
//!
//! Keeps per-day food logs and nutrition totals for signed-in users, backed
//! by Firestore and a remote nutrition analysis service.

use nutrigram::{
    config::{Config, StoreBackend},
    db::{EntryStore, FirestoreDb, MemoryStore},
    services::AnalysisClient,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting NutriGram API");

    let store: Arc<dyn EntryStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory entry store; data will not persist");
            Arc::new(MemoryStore::new())
        }
    };

    let analyzer = Arc::new(AnalysisClient::new(config.analysis_api_url.clone()));
    tracing::info!(url = %config.analysis_api_url, "Nutrition analysis client initialized");

    let state = Arc::new(AppState::new(config.clone(), store, analyzer));

    let app = nutrigram::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nutrigram=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
