// SPDX-License-Identifier: MIT

//! ResQ: disaster reporting with proximity-matched volunteers.
//!
//! This crate provides the backend API for reporting incidents with
//! geolocation and photos, discovering nearby incidents, and tracking
//! the OPEN → IN_PROGRESS → RESOLVED lifecycle.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Db;
use services::{FeedService, GoogleOAuth, LifecycleEngine, MediaService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub lifecycle: LifecycleEngine,
    pub feed: FeedService,
    pub media: MediaService,
    pub google: GoogleOAuth,
}
