// SPDX-License-Identifier: MIT

//! ResQ API Server
//!
//! Disaster-reporting backend: victims report incidents with geolocation
//! and photos, nearby volunteers discover and accept them, and SMS keeps
//! the victim in the loop.

use resq_api::{
    config::Config,
    db::Db,
    services::{FeedService, GoogleOAuth, LifecycleEngine, MediaService, SmsNotifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting ResQ API");

    // Connect to Postgres and apply pending migrations
    let db = Db::connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");
    db.run_migrations().await.expect("Failed to run migrations");

    let notifier = SmsNotifier::new(&config);
    if !notifier.is_configured() {
        tracing::warn!("Twilio not configured; accept notifications will be skipped");
    }

    let media = MediaService::new(&config);
    let google = GoogleOAuth::new(&config);
    let lifecycle = LifecycleEngine::new(db.clone(), notifier);
    let feed = FeedService::new(db.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        lifecycle,
        feed,
        media,
        google,
    });

    // Build router
    let app = resq_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("resq_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
