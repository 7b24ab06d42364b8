//! S3-backed storage provider
//!
//! Works against AWS S3 and S3-compatible stores (Cloudflare R2, MinIO) via
//! an optional custom endpoint. Only URL signing happens here; the client
//! uploads directly to the bucket with the returned URL.

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{BehaviorVersion, Builder, Credentials, Region},
    presigning::PresigningConfig,
    Client as S3Client,
};
use std::time::Duration;
use tracing::debug;

use super::{StorageError, StorageProvider};
use crate::config::StorageSettings;

#[derive(Debug, Clone)]
pub struct S3StorageProvider {
    client: S3Client,
    bucket: String,
}

impl S3StorageProvider {
    /// Create a provider from settings.
    ///
    /// Fails when bucket or credentials are missing; there is no fallback
    /// path once the server is running.
    pub fn new(settings: &StorageSettings) -> Result<Self, StorageError> {
        if settings.bucket.is_empty() {
            return Err(StorageError::NotConfigured(
                "storage.bucket is required for the s3 provider".to_string(),
            ));
        }
        if settings.access_key_id.is_empty() || settings.secret_access_key.is_empty() {
            return Err(StorageError::NotConfigured(
                "storage.access_key_id and storage.secret_access_key are required for the s3 provider"
                    .to_string(),
            ));
        }

        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None, // session token
            None, // expiry
            "asset-gateway-static-credentials",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true); // Required for R2/MinIO

        if let Some(endpoint) = &settings.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint);
            builder = builder.endpoint_url(endpoint);
        }

        let client = S3Client::from_conf(builder.build());

        Ok(Self {
            client,
            bucket: settings.bucket.clone(),
        })
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn presigning_config(expires: Duration) -> Result<PresigningConfig, StorageError> {
        PresigningConfig::expires_in(expires)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))
    }
}

#[async_trait]
impl StorageProvider for S3StorageProvider {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn generate_presigned_put_url(
        &self,
        object_key: &str,
        content_type: &str,
        expires: Duration,
    ) -> Result<String, StorageError> {
        debug!("Presigning PUT for {}", object_key);

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key)
            .content_type(content_type)
            .presigned(Self::presigning_config(expires)?)
            .await
            .map_err(|e| StorageError::PresignFailed(format!("{:?}", e)))?;

        Ok(presigned.uri().to_string())
    }

    async fn generate_presigned_get_url(
        &self,
        object_key: &str,
        expires: Duration,
    ) -> Result<String, StorageError> {
        debug!("Presigning GET for {}", object_key);

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(object_key)
            .presigned(Self::presigning_config(expires)?)
            .await
            .map_err(|e| StorageError::PresignFailed(format!("{:?}", e)))?;

        Ok(presigned.uri().to_string())
    }
}
