// SPDX-License-Identifier: MIT

//! Cloudinary media store client.
//!
//! Uploads incident photos and returns the durable `secure_url`. A failed
//! upload aborts incident creation upstream: no incident is persisted
//! without its photo when one was supplied.

use crate::config::Config;
use crate::error::{AppError, Result};
use serde::Deserialize;

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Clone)]
pub struct MediaService {
    client: reqwest::Client,
    cloud_name: String,
    upload_preset: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl MediaService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: config.cloudinary_cloud_name.clone(),
            upload_preset: config.cloudinary_upload_preset.clone(),
        }
    }

    /// Upload an image and return its durable URL.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<String> {
        if self.cloud_name.is_empty() {
            return Err(AppError::Upstream(
                "Media store not configured".to_string(),
            ));
        }

        let url = format!("{}/{}/image/upload", CLOUDINARY_API_BASE, self.cloud_name);

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| AppError::Upstream(format!("Invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Media upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Media store returned {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Bad media store response: {}", e)))?;

        tracing::info!(url = %body.secure_url, "Image uploaded");

        Ok(body.secure_url)
    }
}
