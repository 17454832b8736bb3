// SPDX-License-Identifier: MIT

//! Incident model and lifecycle status machine.

use crate::models::user::PublicProfile;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incident lifecycle status.
///
/// Transitions form the directed graph OPEN → IN_PROGRESS → {OPEN, RESOLVED};
/// RESOLVED is terminal. The repository's conditional update is the only
/// mechanism that moves an incident between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Open,
    InProgress,
    Resolved,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::InProgress => "IN_PROGRESS",
            Status::Resolved => "RESOLVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Status::Open),
            "IN_PROGRESS" => Some(Status::InProgress),
            "RESOLVED" => Some(Status::Resolved),
            _ => None,
        }
    }
}

/// Incident urgency, reporter-selected. Defaults to `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Low => "LOW",
            Urgency::Medium => "MEDIUM",
            Urgency::High => "HIGH",
        }
    }

    /// Parse a form value case-insensitively; unknown values fall back to
    /// `Medium`, matching what reporters get when the field is omitted.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Urgency::Low,
            "HIGH" => Urgency::High,
            _ => Urgency::Medium,
        }
    }
}

impl Default for Urgency {
    fn default() -> Self {
        Urgency::Medium
    }
}

/// A geographic point, longitude/latitude in WGS84.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Full incident as served by the API.
///
/// `distance` is meters from the caller's reference point when one was
/// available for the query, otherwise absent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub media: Vec<String>,
    pub urgency: Urgency,
    pub phone: String,
    pub status: Status,
    pub user_id: Uuid,
    pub volunteer_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volunteer: Option<PublicProfile>,
}

/// Lightweight map-marker projection: no joins, no pagination, cheap enough
/// for high-frequency refresh.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PinSummary {
    pub id: Uuid,
    pub urgency: String,
    pub status: String,
    pub lat: f64,
    pub lng: f64,
}

/// One page of the nearby feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub data: Vec<Incident>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl FeedPage {
    pub fn empty() -> Self {
        Self {
            data: vec![],
            next_cursor: None,
            has_more: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for s in [Status::Open, Status::InProgress, Status::Resolved] {
            assert_eq!(Status::parse(s.as_str()), Some(s));
        }
        assert_eq!(Status::parse("CLOSED"), None);
    }

    #[test]
    fn urgency_lenient_parse() {
        assert_eq!(Urgency::parse_lenient("high"), Urgency::High);
        assert_eq!(Urgency::parse_lenient(" Low "), Urgency::Low);
        assert_eq!(Urgency::parse_lenient("whatever"), Urgency::Medium);
        assert_eq!(Urgency::parse_lenient(""), Urgency::Medium);
    }

    #[test]
    fn geo_point_finiteness() {
        assert!(GeoPoint { lat: 6.9271, lng: 79.8612 }.is_finite());
        assert!(!GeoPoint { lat: f64::NAN, lng: 0.0 }.is_finite());
        assert!(!GeoPoint { lat: 0.0, lng: f64::INFINITY }.is_finite());
    }
}
