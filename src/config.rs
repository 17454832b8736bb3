// SPDX-License-Identifier: MIT

//! Application configuration loaded once at startup from environment variables.
//!
//! The resulting `Config` is immutable and handed to services by value; there
//! is no ambient mutable configuration anywhere in the process.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Server ---
    /// Server port
    pub port: u16,
    /// Frontend URL for OAuth redirects and CORS
    pub frontend_url: String,
    /// Host this API is reachable at, used for OAuth callback URLs when a
    /// request carries no Host header
    pub api_host: String,
    /// Postgres connection string (PostGIS-enabled database)
    pub database_url: String,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for signing the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,

    // --- Google OAuth ---
    pub google_client_id: String,
    pub google_client_secret: String,

    // --- Cloudinary (media store) ---
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,

    // --- Twilio (SMS gateway) ---
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_number: String,
    /// Country-code prefix prepended to national numbers before SMS delivery
    pub sms_country_code: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// For local development, a `.env` file is honored if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .unwrap_or(3001),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "localhost:3001".to_string()),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),

            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,

            cloudinary_cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .unwrap_or_else(|_| String::new()),
            cloudinary_upload_preset: env::var("CLOUDINARY_UPLOAD_PRESET")
                .unwrap_or_else(|_| String::new()),

            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_else(|_| String::new()),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| String::new()),
            twilio_from_number: env::var("TWILIO_FROM_NUMBER").unwrap_or_else(|_| String::new()),
            sms_country_code: env::var("SMS_COUNTRY_CODE").unwrap_or_else(|_| "+94".to_string()),
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            port: 3001,
            frontend_url: "http://localhost:3000".to_string(),
            api_host: "localhost:3001".to_string(),
            database_url: "postgres://localhost/resq_test".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
            google_client_id: "test_client_id".to_string(),
            google_client_secret: "test_secret".to_string(),
            // Left unconfigured so tests never talk to the media store
            cloudinary_cloud_name: String::new(),
            cloudinary_upload_preset: String::new(),
            twilio_account_sid: "ACtest".to_string(),
            twilio_auth_token: "test-token".to_string(),
            twilio_from_number: "+15550000000".to_string(),
            sms_country_code: "+94".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("DATABASE_URL", "postgres://localhost/resq");
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("OAUTH_STATE_KEY", "test_oauth_state_key");
        env::set_var("GOOGLE_CLIENT_ID", "test_id");
        env::set_var("GOOGLE_CLIENT_SECRET", "test_secret");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.google_client_id, "test_id");
        assert_eq!(config.port, 3001);
        assert_eq!(config.api_host, "localhost:3001");
        assert_eq!(config.sms_country_code, "+94");
    }
}
