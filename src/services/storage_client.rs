// src/services/storage_client.rs
// DOCUMENTATION: Object storage collaborator client
// PURPOSE: Upload image bytes and hand back a durable public URL

use crate::errors::SpotsError;
use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path` and return its public URL
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, SpotsError>;
}

/// Unique object path keeping the file extension
pub fn object_path(file_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => {
            format!("{}-{}.{}", millis, Uuid::new_v4().simple(), ext.to_lowercase())
        }
        _ => format!("{}-{}", millis, Uuid::new_v4().simple()),
    }
}

/// Storage bucket reachable over HTTP
pub struct HttpObjectStorage {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl HttpObjectStorage {
    pub fn new(base_url: String, service_key: String, bucket: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, path)
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, SpotsError> {
        if self.base_url.is_empty() {
            return Err(SpotsError::StorageError(
                "object storage is not configured".to_string(),
            ));
        }

        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, path);
        let size = bytes.len();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                log::error!("Upload of {} failed: {}", path, e);
                SpotsError::StorageError(format!("upload failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Storage error {} for {}: {}", status, path, body);
            return Err(SpotsError::StorageError(format!(
                "storage returned {}",
                status
            )));
        }

        log::info!("Uploaded {} ({} bytes)", path, size);
        Ok(self.public_url(path))
    }
}
