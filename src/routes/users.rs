// SPDX-License-Identifier: MIT

//! User profile routes.

use crate::db::users::ProfileUpdate;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::{Role, User};
use crate::AppState;
use axum::{extract::State, routing::patch, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User routes requiring authentication.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/me", patch(update_me))
}

#[derive(Deserialize)]
struct UpdateMeRequest {
    /// "VICTIM" or "VOLUNTEER"
    role: Option<String>,
    name: Option<String>,
    phone: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateMeResponse {
    user: User,
    /// Refreshed session token reflecting the new role/location.
    access_token: String,
}

/// Update the caller's own profile (role switch, onboarding location,
/// contact phone) and return a refreshed credential.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<UpdateMeResponse>> {
    let role = body
        .role
        .as_deref()
        .map(|raw| {
            Role::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Unknown role: {}", raw)))
        })
        .transpose()?;

    if let Some(lat) = body.lat {
        if !lat.is_finite() {
            return Err(AppError::Validation("lat must be finite".to_string()));
        }
    }
    if let Some(lng) = body.lng {
        if !lng.is_finite() {
            return Err(AppError::Validation("lng must be finite".to_string()));
        }
    }

    let update = ProfileUpdate {
        role,
        name: body.name,
        phone: body.phone,
        lat: body.lat,
        lng: body.lng,
    };

    let updated = state
        .db
        .update_profile(user.id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;

    let refreshed_role = updated
        .role()
        .ok_or_else(|| AppError::Database(format!("Unknown role: {}", updated.role)))?;

    let access_token = create_jwt(
        updated.id,
        &updated.email,
        refreshed_role,
        &state.config.jwt_signing_key,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(user_id = %updated.id, role = %updated.role, "Profile updated");

    Ok(Json(UpdateMeResponse {
        user: updated,
        access_token,
    }))
}
