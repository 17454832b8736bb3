// SPDX-License-Identifier: MIT

//! Google OAuth authentication routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, SESSION_COOKIE};
use crate::models::User;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/google", get(auth_start))
        .route("/api/auth/google/callback", get(auth_callback))
        .route("/api/auth/logout", get(logout))
}

/// Routes requiring authentication (layered in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/me", get(get_me))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to redirect back to after OAuth completes.
    /// If not provided, uses FRONTEND_URL env var.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start OAuth flow - redirect to Google authorization.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    // Get the frontend URL from query param or fall back to config
    let frontend_url = params
        .redirect_uri
        .unwrap_or_else(|| state.config.frontend_url.clone());

    // Encode frontend URL + timestamp in state
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    // Create the data payload: "frontend_url|timestamp_hex"
    let state_payload = format!("{}|{:x}", frontend_url, timestamp);

    // Sign the payload
    let mut mac = HmacSha256::new_from_slice(&state.config.oauth_state_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(state_payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    // Combine payload + signature and base64 encode for the URL
    let signed_state = format!("{}|{}", state_payload, hex::encode(signature));
    let oauth_state = URL_SAFE_NO_PAD.encode(signed_state.as_bytes());

    let callback_url = callback_url_from_headers(&headers, &state.config.api_host);
    let auth_url = state.google.authorize_url(&callback_url, &oauth_state);

    tracing::info!(frontend_url = %frontend_url, "Starting OAuth flow, redirecting to Google");

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    code: String,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code, upsert user, create session.
///
/// The session token is both set as an HTTP-only cookie and handed to the
/// frontend in the redirect URL.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    // Decode and verify frontend URL from state parameter
    let frontend_url = verify_and_decode_state(&params.state, &state.config.oauth_state_key)
        .unwrap_or_else(|| {
            tracing::warn!(
                "Invalid or tampered state parameter, falling back to default frontend URL"
            );
            state.config.frontend_url.clone()
        });

    // Check for OAuth errors
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        let redirect = format!("{}?error={}", frontend_url, error);
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    tracing::info!("Exchanging authorization code for identity");

    let callback_url = callback_url_from_headers(&headers, &state.config.api_host);
    let profile = state.google.exchange_code(&params.code, &callback_url).await?;

    // First login creates the user with the default VICTIM role
    let user = state
        .db
        .upsert_oauth_user(&profile.email, profile.name.as_deref(), profile.picture.as_deref())
        .await?;

    let role = user
        .role()
        .ok_or_else(|| AppError::Database(format!("Unknown role: {}", user.role)))?;

    tracing::info!(user_id = %user.id, role = role.as_str(), "OAuth successful");

    // Create JWT session token
    let jwt = create_jwt(user.id, &user.email, role, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    // Redirect to frontend with token
    let redirect_url = format!("{}/callback?token={}", frontend_url, jwt);
    let jar = jar.add(session_cookie(jwt));

    Ok((jar, Redirect::temporary(&redirect_url)))
}

/// Current user identity with role and last-known location.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    let profile = state
        .db
        .get_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;

    Ok(Json(profile))
}

/// Logout - clear the session cookie. The frontend also drops its copy of
/// the token.
async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::temporary("/"))
}

fn session_cookie(jwt: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, jwt))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Reconstruct this service's OAuth callback URL from the request host,
/// falling back to the configured API host.
fn callback_url_from_headers(headers: &axum::http::HeaderMap, fallback_host: &str) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or(fallback_host);

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{}://{}/api/auth/google/callback", scheme, host)
}

/// Verify HMAC signature and decode the frontend URL from the OAuth state parameter.
fn verify_and_decode_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "frontend_url|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let frontend_url = parts[0];
    let timestamp_hex = parts[1];
    let signature_hex = parts[2];

    // Reconstruct payload and verify signature
    let payload = format!("{}|{}", frontend_url, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());

    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if signature_hex != expected_signature {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    Some(frontend_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_and_decode_state_success() {
        let secret = b"secret_key";
        let frontend_url = "https://example.com";
        let timestamp = 1234567890u128;

        let payload = format!("{}|{:x}", frontend_url, timestamp);
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let state_data = format!("{}|{}", payload, signature);
        let encoded_state = URL_SAFE_NO_PAD.encode(state_data.as_bytes());

        let result = verify_and_decode_state(&encoded_state, secret);
        assert_eq!(result, Some(frontend_url.to_string()));
    }

    #[test]
    fn test_verify_and_decode_state_invalid_signature() {
        let secret = b"secret_key";
        let state_data = format!("{}|{:x}|{}", "https://example.com", 1234567890u128, "bogus");
        let encoded_state = URL_SAFE_NO_PAD.encode(state_data.as_bytes());

        assert_eq!(verify_and_decode_state(&encoded_state, secret), None);
    }

    #[test]
    fn test_verify_and_decode_state_wrong_secret() {
        let secret = b"secret_key";
        let frontend_url = "https://example.com";

        let payload = format!("{}|{:x}", frontend_url, 1234567890u128);
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let state_data = format!("{}|{}", payload, signature);
        let encoded_state = URL_SAFE_NO_PAD.encode(state_data.as_bytes());

        assert_eq!(verify_and_decode_state(&encoded_state, b"wrong_key"), None);
    }

    #[test]
    fn test_callback_url_uses_host_header() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(axum::http::header::HOST, "api.resq.example".parse().unwrap());
        assert_eq!(
            callback_url_from_headers(&headers, "localhost:3001"),
            "https://api.resq.example/api/auth/google/callback"
        );
    }

    #[test]
    fn test_callback_url_falls_back_to_configured_host() {
        let headers = axum::http::HeaderMap::new();
        assert_eq!(
            callback_url_from_headers(&headers, "localhost:3001"),
            "http://localhost:3001/api/auth/google/callback"
        );
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("jwt-value".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "jwt-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
