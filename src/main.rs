// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! StudyHub API Server
//!
//! Serves the course catalog, YouTube-backed lessons, study materials and
//! progress tracking for the StudyHub web app.

use std::sync::Arc;
use studyhub::{
    config::Config,
    db::{FirestoreDb, MemoryDb, Store},
    services::{accounts::seed_super_admin, create_notifier},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        environment = ?config.environment,
        "Starting StudyHub API"
    );
    if config.admin_email.is_none() {
        tracing::warn!("ADMIN_EMAIL not set, admin routes are disabled");
    }
    if config.youtube_api_key.is_none() {
        tracing::warn!("YOUTUBE_API_KEY not set, imports are disabled");
    }

    let db: Arc<dyn Store> = if config.memory_store {
        tracing::warn!("STORE=memory, data will not survive a restart");
        Arc::new(MemoryDb::new())
    } else {
        Arc::new(FirestoreDb::new(&config.gcp_project_id).await?)
    };

    seed_super_admin(db.as_ref(), &config).await?;

    let notifier = create_notifier(&config);

    tokio::fs::create_dir_all(config.upload_dir.join("materials")).await?;

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, notifier));

    // Build router
    let app = studyhub::routes::create_router(state);

    // Start server
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
                .add_directive("studyhub=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
