//! Fake storage provider for local development and tests
//!
//! No real signature is produced; the inputs are echoed into the query string
//! so the resulting URL is deterministic and human-readable.

use async_trait::async_trait;
use std::time::Duration;

use super::{StorageError, StorageProvider};

const FAKE_UPLOAD_ENDPOINT: &str = "http://fake-storage/upload";
const FAKE_DOWNLOAD_ENDPOINT: &str = "http://fake-storage/download";

#[derive(Debug, Default, Clone)]
pub struct FakeStorageProvider;

impl FakeStorageProvider {
    pub fn new() -> Self {
        FakeStorageProvider
    }
}

#[async_trait]
impl StorageProvider for FakeStorageProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn generate_presigned_put_url(
        &self,
        object_key: &str,
        content_type: &str,
        expires: Duration,
    ) -> Result<String, StorageError> {
        let url = url::Url::parse_with_params(
            FAKE_UPLOAD_ENDPOINT,
            &[
                ("object_key", object_key),
                ("content_type", content_type),
                ("expires", &expires.as_secs().to_string()),
            ],
        )
        .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(url.to_string())
    }

    async fn generate_presigned_get_url(
        &self,
        object_key: &str,
        expires: Duration,
    ) -> Result<String, StorageError> {
        let url = url::Url::parse_with_params(
            FAKE_DOWNLOAD_ENDPOINT,
            &[
                ("object_key", object_key),
                ("expires", &expires.as_secs().to_string()),
            ],
        )
        .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(url.to_string())
    }
}
