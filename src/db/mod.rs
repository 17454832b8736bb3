// SPDX-License-Identifier: MIT

//! Postgres client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (OAuth upsert, profile updates)
//! - Incidents (geospatial insert/query, conditional status updates)
//!
//! All statements are parameterized; the geospatial contract (great-circle
//! meters via PostGIS `geography`) lives entirely in this layer.

pub mod incidents;
pub mod users;

use crate::error::AppError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const MAX_CONNECTIONS: u32 = 10;

/// Postgres database client.
#[derive(Clone)]
pub struct Db {
    pool: Option<PgPool>,
}

impl Db {
    /// Connect to Postgres and verify the connection.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Postgres: {}", e)))?;

        tracing::info!("Connected to Postgres");

        Ok(Self { pool: Some(pool) })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { pool: None }
    }

    /// Run pending schema migrations.
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(self.pool()?)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))
    }

    /// Helper to get the pool or return an error if offline.
    pub(crate) fn pool(&self) -> Result<&PgPool, AppError> {
        self.pool
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}
