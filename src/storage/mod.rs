//! Object storage providers
//!
//! The service layer only depends on the `StorageProvider` trait; the fake
//! provider covers local development and tests, the S3 provider covers real
//! buckets (including S3-compatible stores such as R2 and MinIO).

mod fake;
mod s3;

pub use fake::FakeStorageProvider;
pub use s3::S3StorageProvider;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::Settings;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage provider not configured: {0}")]
    NotConfigured(String),

    #[error("Unsupported storage provider: {0}")]
    UnsupportedProvider(String),

    #[error("Presigning failed: {0}")]
    PresignFailed(String),

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
}

/// Capability contract for presigned URL generation.
///
/// Implementations sign URLs, they never move bytes themselves.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug {
    /// Provider code recorded on completed uploads (e.g. "fake", "s3")
    fn name(&self) -> &'static str;

    /// Generate a URL authorizing a single PUT of `content_type` bytes,
    /// valid for `expires`.
    async fn generate_presigned_put_url(
        &self,
        object_key: &str,
        content_type: &str,
        expires: Duration,
    ) -> Result<String, StorageError>;

    /// Generate a URL authorizing read access, valid for `expires`.
    ///
    /// Only needed for private-read buckets; unimplemented by default.
    async fn generate_presigned_get_url(
        &self,
        _object_key: &str,
        _expires: Duration,
    ) -> Result<String, StorageError> {
        Err(StorageError::Unsupported(
            "presigned GET is not implemented by this provider",
        ))
    }
}

/// Create the storage provider selected by configuration.
///
/// The S3 variant fails here, before the server starts, when bucket or
/// credentials are missing.
pub fn create_storage_provider(
    settings: &Settings,
) -> Result<Arc<dyn StorageProvider>, StorageError> {
    match settings.storage.provider.as_str() {
        "fake" => Ok(Arc::new(FakeStorageProvider::new())),
        "s3" => Ok(Arc::new(S3StorageProvider::new(&settings.storage)?)),
        other => Err(StorageError::UnsupportedProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider that only signs PUTs, leaning on the trait's GET default
    #[derive(Debug)]
    struct PutOnlyProvider;

    #[async_trait]
    impl StorageProvider for PutOnlyProvider {
        fn name(&self) -> &'static str {
            "put-only"
        }

        async fn generate_presigned_put_url(
            &self,
            _object_key: &str,
            _content_type: &str,
            _expires: Duration,
        ) -> Result<String, StorageError> {
            Ok("http://put-only/upload".to_string())
        }
    }

    #[actix_rt::test]
    async fn presigned_get_is_unsupported_by_default() {
        let provider = PutOnlyProvider;
        let err = provider
            .generate_presigned_get_url("cat/ent/file.png", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unsupported(_)));
    }

    #[test]
    fn factory_selects_fake_provider() {
        let mut settings = Settings::default();
        settings.storage.provider = "fake".to_string();

        let provider = create_storage_provider(&settings).unwrap();
        assert_eq!(provider.name(), "fake");
    }

    #[test]
    fn factory_rejects_unknown_provider() {
        let mut settings = Settings::default();
        settings.storage.provider = "carrier-pigeon".to_string();

        let err = create_storage_provider(&settings).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedProvider(_)));
    }

    #[test]
    fn factory_fails_fast_on_unconfigured_s3() {
        let mut settings = Settings::default();
        settings.storage.provider = "s3".to_string();

        let err = create_storage_provider(&settings).unwrap_err();
        assert!(matches!(err, StorageError::NotConfigured(_)));
    }
}
