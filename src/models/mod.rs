// SPDX-License-Identifier: MIT

//! Domain models shared between the repository, services and routes.

pub mod incident;
pub mod user;

pub use incident::{FeedPage, GeoPoint, Incident, PinSummary, Status, Urgency};
pub use user::{PublicProfile, Role, User};
