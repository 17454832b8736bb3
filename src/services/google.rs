// SPDX-License-Identifier: MIT

//! Google OAuth2 client: authorization URL, code exchange, userinfo fetch.
//!
//! Only the code-exchange surface lives here; session issuance and the
//! signed `state` parameter are handled by the auth routes.

use crate::config::Config;
use crate::error::{AppError, Result};
use serde::Deserialize;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Identity fields returned by Google's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Clone)]
pub struct GoogleOAuth {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl GoogleOAuth {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
        }
    }

    /// Build the Google authorization redirect URL.
    pub fn authorize_url(&self, callback_url: &str, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope=openid%20email%20profile&state={}",
            AUTH_ENDPOINT,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(callback_url),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for the user's Google profile.
    pub async fn exchange_code(&self, code: &str, callback_url: &str) -> Result<GoogleProfile> {
        let token: TokenResponse = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", callback_url),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Google token exchange failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Upstream(format!("Google token exchange rejected: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Bad Google token response: {}", e)))?;

        let profile: GoogleProfile = self
            .client
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Google userinfo failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Upstream(format!("Google userinfo rejected: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Bad Google userinfo response: {}", e)))?;

        Ok(profile)
    }
}
