// SPDX-License-Identifier: MIT

//! User model for storage and API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role. New accounts default to `Victim`; users switch to `Volunteer`
/// during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Victim,
    Volunteer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Victim => "VICTIM",
            Role::Volunteer => "VOLUNTEER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "VICTIM" => Some(Role::Victim),
            "VOLUNTEER" => Some(Role::Volunteer),
            _ => None,
        }
    }
}

/// User profile row in Postgres.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Email address (unique, comes from the OAuth profile)
    pub email: String,
    pub name: Option<String>,
    /// Avatar URL
    pub image: Option<String>,
    /// VICTIM or VOLUNTEER
    pub role: String,
    /// Contact number; required before a volunteer accepts work
    pub phone: Option<String>,
    /// Last known location, set during onboarding
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

/// Public slice of a user embedded in incident responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: Option<String>,
    pub image: Option<String>,
    pub phone: Option<String>,
}
