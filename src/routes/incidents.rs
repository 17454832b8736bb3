// SPDX-License-Identifier: MIT

//! Incident routes: reporting, the nearby feed, map pins, history views and
//! lifecycle transitions.

use crate::db::incidents::{FeedCursor, NewIncident};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{FeedPage, GeoPoint, Incident, PinSummary, Urgency};
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_RADIUS_METERS: f64 = 10_000.0;
const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Headroom above [`MAX_UPLOAD_BYTES`] for multipart framing and the text
/// fields, so the body limit never fires before the explicit size check.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;
const CURSOR_PARTS: usize = 2;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Public incident routes (no auth).
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/incidents/nearby", get(nearby))
        .route("/api/incidents/map-pins", get(map_pins))
}

/// Incident routes requiring authentication.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/incidents",
            post(create_incident)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/api/incidents/my-reports", get(my_reports))
        .route("/api/incidents/my-responses", get(my_responses))
        .route("/api/incidents/{id}", get(get_incident))
        .route("/api/incidents/{id}/accept", patch(accept_incident))
        .route("/api/incidents/{id}/cancel", patch(cancel_incident))
        .route("/api/incidents/{id}/close", patch(close_incident))
}

// ─── Cursor Codec ────────────────────────────────────────────

/// Encode a feed cursor as an opaque token.
///
/// The distance is carried as raw f64 bits so the strictly-greater keyset
/// comparison stays exact against the value PostGIS recomputes next page.
pub fn encode_cursor(cursor: FeedCursor) -> String {
    let payload = format!("{}:{}", cursor.distance.to_bits(), cursor.id);
    URL_SAFE_NO_PAD.encode(payload)
}

pub fn parse_cursor(cursor: Option<&str>) -> Result<Option<FeedCursor>> {
    cursor
        .map(|raw| {
            let invalid_cursor =
                || AppError::Validation("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            let parts: Vec<&str> = decoded_str.split(':').collect();
            if parts.len() != CURSOR_PARTS {
                return Err(invalid_cursor());
            }

            let bits = parts[0].parse::<u64>().map_err(|_| invalid_cursor())?;
            let id = parts[1].parse::<Uuid>().map_err(|_| invalid_cursor())?;
            let distance = f64::from_bits(bits);
            if !distance.is_finite() || distance < 0.0 {
                return Err(invalid_cursor());
            }

            Ok(FeedCursor { distance, id })
        })
        .transpose()
}

// ─── Nearby Feed ─────────────────────────────────────────────

#[derive(Deserialize)]
struct NearbyQuery {
    lat: f64,
    lng: f64,
    /// Search radius in meters
    #[serde(default = "default_radius")]
    radius: f64,
    /// Page size (hard-capped server-side)
    #[serde(default = "default_limit")]
    limit: i64,
    /// Cursor for forward pagination (opaque token).
    cursor: Option<String>,
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS_METERS
}
fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn parse_center(lat: f64, lng: f64) -> Result<GeoPoint> {
    let center = GeoPoint { lat, lng };
    if !center.is_finite() {
        return Err(AppError::Validation(
            "Valid latitude and longitude are required".to_string(),
        ));
    }
    Ok(center)
}

/// Paginated feed of open and in-progress incidents near a point.
async fn nearby(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<FeedPage>> {
    let center = parse_center(params.lat, params.lng)?;
    if !params.radius.is_finite() || params.radius <= 0.0 {
        return Err(AppError::Validation("Radius must be positive".to_string()));
    }
    if params.limit < 1 {
        return Err(AppError::Validation(
            "Limit must be greater than 0".to_string(),
        ));
    }
    let cursor = parse_cursor(params.cursor.as_deref())?;

    let page = state
        .feed
        .nearby_feed(center, params.radius, params.limit, cursor)
        .await;

    Ok(Json(page))
}

#[derive(Deserialize)]
struct MapPinsQuery {
    lat: f64,
    lng: f64,
    #[serde(default = "default_radius")]
    radius: f64,
}

/// Map markers for every incident in radius.
async fn map_pins(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapPinsQuery>,
) -> Result<Json<Vec<PinSummary>>> {
    let center = parse_center(params.lat, params.lng)?;
    if !params.radius.is_finite() || params.radius <= 0.0 {
        return Err(AppError::Validation("Radius must be positive".to_string()));
    }

    Ok(Json(state.feed.map_pins(center, params.radius).await))
}

// ─── Reporting ───────────────────────────────────────────────

/// Create an incident from a multipart form with an optional scene photo.
///
/// The photo is uploaded to the media store first; an upload failure aborts
/// the whole creation so no incident is persisted without its photo.
async fn create_incident(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Incident>)> {
    let mut title = None;
    let mut description = None;
    let mut lat = None;
    let mut lng = None;
    let mut urgency = Urgency::default();
    let mut phone = None;
    let mut photo: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(read_text(field).await?),
            "description" => description = Some(read_text(field).await?),
            "lat" => lat = Some(read_coord(field, "lat").await?),
            "lng" => lng = Some(read_coord(field, "lng").await?),
            "urgency" => urgency = Urgency::parse_lenient(&read_text(field).await?),
            "phone" => phone = Some(read_text(field).await?),
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if !has_image_extension(&file_name) {
                    return Err(AppError::Validation(
                        "Only jpg, jpeg, png, gif and webp files are accepted".to_string(),
                    ));
                }
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;
                if bytes.len() > MAX_UPLOAD_BYTES {
                    return Err(AppError::Validation(
                        "Image exceeds the 10MB upload limit".to_string(),
                    ));
                }
                photo = Some((bytes.to_vec(), file_name, content_type));
            }
            _ => {}
        }
    }

    let title = title.ok_or_else(|| AppError::Validation("Title is required".to_string()))?;
    let phone = phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Contact phone is required".to_string()))?;
    let point = GeoPoint {
        lat: lat.ok_or_else(|| AppError::Validation("lat is required".to_string()))?,
        lng: lng.ok_or_else(|| AppError::Validation("lng is required".to_string()))?,
    };

    let mut media = Vec::new();
    if let Some((bytes, file_name, content_type)) = photo {
        let url = state
            .media
            .upload_image(bytes, &file_name, &content_type)
            .await?;
        media.push(url);
    }

    let incident = state
        .lifecycle
        .create(
            &user,
            NewIncident {
                title,
                description,
                point,
                media,
                urgency,
                phone,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(incident)))
}

fn has_image_extension(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart field: {}", e)))
}

async fn read_coord(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<f64> {
    let raw = read_text(field).await?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("'{}' must be a number", name)))?;
    if !value.is_finite() {
        return Err(AppError::Validation(format!("'{}' must be finite", name)));
    }
    Ok(value)
}

// ─── Detail & History ────────────────────────────────────────

/// Last known location of the caller, for distance annotations.
async fn caller_location(state: &AppState, user: &AuthUser) -> Result<Option<GeoPoint>> {
    let profile = state.db.get_user(user.id).await?;
    Ok(profile.and_then(|p| match (p.lat, p.lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        _ => None,
    }))
}

/// Full incident with owner/volunteer profiles and distance from the caller.
async fn get_incident(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Incident>> {
    let location = caller_location(&state, &user).await?;
    let mut incident = state
        .db
        .find_incident_by_id(id, location)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))?;
    incident.distance = incident.distance.map(f64::round);

    Ok(Json(incident))
}

/// Incidents the caller has reported.
async fn my_reports(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Incident>>> {
    let location = caller_location(&state, &user).await?;
    let items = state.feed.my_reports(user.id, location).await?;
    Ok(Json(items))
}

/// Incidents the caller has responded to as a volunteer.
async fn my_responses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Incident>>> {
    let location = caller_location(&state, &user).await?;
    let items = state.feed.my_responses(user.id, location).await?;
    Ok(Json(items))
}

// ─── Lifecycle Transitions ───────────────────────────────────

async fn accept_incident(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Incident>> {
    Ok(Json(state.lifecycle.accept(&user, id).await?))
}

async fn cancel_incident(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Incident>> {
    Ok(Json(state.lifecycle.cancel(&user, id).await?))
}

async fn close_incident(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Incident>> {
    Ok(Json(state.lifecycle.close(&user, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let cursor = FeedCursor {
            distance: 1234.567891,
            id: Uuid::new_v4(),
        };

        let encoded = encode_cursor(cursor);
        let decoded = parse_cursor(Some(&encoded)).unwrap().unwrap();

        assert_eq!(decoded.distance.to_bits(), cursor.distance.to_bits());
        assert_eq!(decoded.id, cursor.id);
    }

    #[test]
    fn test_cursor_rejects_invalid_input() {
        for raw in ["not-base64!!", "", "aGVsbG8", "MTIzNDo1Njc4OmV4dHJh"] {
            let err = parse_cursor(Some(raw)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "raw: {raw}");
        }
    }

    #[test]
    fn test_cursor_rejects_non_finite_distance() {
        let payload = format!("{}:{}", f64::NAN.to_bits(), Uuid::new_v4());
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let err = parse_cursor(Some(&encoded)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_absent_cursor_is_none() {
        assert!(parse_cursor(None).unwrap().is_none());
    }

    #[test]
    fn test_image_extension_allowlist() {
        assert!(has_image_extension("scene.jpg"));
        assert!(has_image_extension("scene.JPEG"));
        assert!(has_image_extension("scene.webp"));
        assert!(!has_image_extension("scene.pdf"));
        assert!(!has_image_extension("scene.jpg.exe"));
        assert!(!has_image_extension("no-extension"));
        assert!(!has_image_extension(""));
    }
}
