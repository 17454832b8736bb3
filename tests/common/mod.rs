// SPDX-License-Identifier: MIT

use resq_api::config::Config;
use resq_api::db::Db;
use resq_api::middleware::auth::create_jwt;
use resq_api::models::Role;
use resq_api::routes::create_router;
use resq_api::services::{FeedService, GoogleOAuth, LifecycleEngine, MediaService, SmsNotifier};
use resq_api::AppState;
use std::sync::Arc;
use uuid::Uuid;

/// Check if a test database is available via environment variable.
#[allow(dead_code)]
pub fn database_available() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

/// Skip test with message if no test database is available.
#[macro_export]
macro_rules! require_db {
    () => {
        if !crate::common::database_available() {
            eprintln!("⚠️  Skipping: DATABASE_URL not set");
            return;
        }
    };
}

fn build_state(config: Config, db: Db) -> Arc<AppState> {
    let notifier = SmsNotifier::new(&config);
    let media = MediaService::new(&config);
    let google = GoogleOAuth::new(&config);
    let lifecycle = LifecycleEngine::new(db.clone(), notifier);
    let feed = FeedService::new(db.clone());

    Arc::new(AppState {
        config,
        db,
        lifecycle,
        feed,
        media,
        google,
    })
}

/// Create a test app with an offline mock database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = build_state(Config::test_default(), Db::new_mock());
    (create_router(state.clone()), state)
}

/// Create a test app backed by the database named in DATABASE_URL, with
/// migrations applied. Call only after `require_db!()`.
#[allow(dead_code)]
pub async fn create_db_app() -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");

    let db = Db::connect(&config.database_url)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");

    let state = build_state(config, db);
    (create_router(state.clone()), state)
}

/// Create a signed session token for a test user.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: Uuid, email: &str, role: Role, signing_key: &[u8]) -> String {
    create_jwt(user_id, email, role, signing_key).expect("Failed to create test JWT")
}
