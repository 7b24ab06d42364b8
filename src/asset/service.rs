//! Asset service: object-key derivation, URL signing, completion bookkeeping

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::db::{AssetRecord, AssetRepository, DbError, NewAssetUpload};
use crate::storage::{StorageError, StorageProvider};

/// Presigned upload URLs expire after ten minutes unless the caller says otherwise.
pub const DEFAULT_UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// Upload status recorded for every completion in current scope
const UPLOAD_STATUS_ACKNOWLEDGED: i32 = 0;

/// Errors surfaced by the asset service
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{0}")]
    Validation(String),

    #[error("Asset repository is not configured. Set database.url to enable persistence.")]
    RepositoryNotConfigured,

    #[error("Persistence failed: {0}")]
    Repository(#[from] DbError),

    #[error("Storage provider failed: {0}")]
    Storage(#[from] StorageError),
}

/// Caller-supplied fields of a completion call.
///
/// Everything except `object_key` is optional; missing metadata is derived
/// from the key or left null for the merge-upsert to preserve.
#[derive(Debug, Clone, Default)]
pub struct CompleteUpload {
    pub object_key: String,
    pub category: Option<String>,
    pub entity_id: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub file_size: Option<i64>,
    pub etag: Option<String>,
}

/// Stateless orchestration over a storage provider and an optional repository
pub struct AssetService {
    asset_base_url: String,
    storage: Arc<dyn StorageProvider>,
    repository: Option<Arc<dyn AssetRepository>>,
}

impl AssetService {
    pub fn new(
        asset_base_url: impl Into<String>,
        storage: Arc<dyn StorageProvider>,
        repository: Option<Arc<dyn AssetRepository>>,
    ) -> Self {
        AssetService {
            asset_base_url: asset_base_url.into(),
            storage,
            repository,
        }
    }

    /// Derive a unique object key: `{category}/{entity_id}/{token}{ext}`.
    ///
    /// The token is a random 128-bit hex string, so repeated calls with the
    /// same inputs never collide. The extension is taken verbatim from the
    /// supplied filename, including the empty string when there is none.
    pub fn generate_object_key(
        &self,
        category: &str,
        entity_id: &str,
        filename: &str,
    ) -> Result<String, AssetError> {
        validate_segment("category", category)?;
        validate_segment("entity_id", entity_id)?;
        if filename.is_empty() {
            return Err(AssetError::Validation("filename must not be empty".to_string()));
        }

        // A trailing-dot filename ("face.") yields Some("") here; treat it
        // the same as no extension at all.
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let token = Uuid::new_v4().simple();

        Ok(format!("{}/{}/{}{}", category, entity_id, token, ext))
    }

    /// Generate a presigned PUT URL via the configured provider
    pub async fn generate_upload_url(
        &self,
        object_key: &str,
        content_type: &str,
        expires: Duration,
    ) -> Result<String, AssetError> {
        let url = self
            .storage
            .generate_presigned_put_url(object_key, content_type, expires)
            .await?;
        debug!(object_key, "Generated upload URL");
        Ok(url)
    }

    /// Build the public-facing URL for a stored object.
    ///
    /// Insensitive to trailing slashes in the configured base URL.
    pub fn build_asset_url(&self, object_key: &str) -> String {
        format!("{}/{}", self.asset_base_url.trim_end_matches('/'), object_key)
    }

    /// Record a completed upload.
    ///
    /// The object key is the source of truth: caller-supplied category and
    /// entity id must agree with its first two segments, and the filename
    /// defaults to its final segment. Re-submissions for the same key merge
    /// into the existing record.
    pub async fn complete_upload(&self, request: CompleteUpload) -> Result<(), AssetError> {
        let repository = self
            .repository
            .as_ref()
            .ok_or(AssetError::RepositoryNotConfigured)?;

        let (parsed_category, parsed_entity_id) = parse_category_and_entity(&request.object_key)?;

        if let Some(category) = &request.category {
            if category != &parsed_category {
                return Err(AssetError::Validation(
                    "category does not match object_key".to_string(),
                ));
            }
        }
        if let Some(entity_id) = &request.entity_id {
            if entity_id != &parsed_entity_id {
                return Err(AssetError::Validation(
                    "entity_id does not match object_key".to_string(),
                ));
            }
        }

        let filename = request.filename.clone().or_else(|| {
            request
                .object_key
                .rsplit('/')
                .next()
                .map(|name| name.to_string())
        });

        let upload = NewAssetUpload {
            object_key: request.object_key.clone(),
            category: parsed_category,
            entity_id: parsed_entity_id,
            filename,
            content_type: request.content_type,
            file_size: request.file_size,
            etag: request.etag,
            storage_provider: self.storage.name().to_string(),
            upload_status: UPLOAD_STATUS_ACKNOWLEDGED,
        };

        repository.upsert_completed_upload(&upload).await?;
        debug!(object_key = %request.object_key, "Completed upload acknowledged");
        Ok(())
    }

    /// List completed uploads, newest first, capped at `limit`
    pub async fn list_assets(
        &self,
        limit: i64,
        category: Option<&str>,
        entity_id: Option<&str>,
    ) -> Result<Vec<AssetRecord>, AssetError> {
        let repository = self
            .repository
            .as_ref()
            .ok_or(AssetError::RepositoryNotConfigured)?;

        Ok(repository.list_assets(limit, category, entity_id).await?)
    }
}

fn validate_segment(field: &str, value: &str) -> Result<(), AssetError> {
    if value.is_empty() {
        return Err(AssetError::Validation(format!("{} must not be empty", field)));
    }
    if value.contains('/') {
        return Err(AssetError::Validation(format!(
            "{} must not contain '/'",
            field
        )));
    }
    Ok(())
}

/// Split an object key into its category and entity id.
///
/// Keys must carry at least three non-empty segments:
/// `{category}/{entity_id}/{filename}`.
fn parse_category_and_entity(object_key: &str) -> Result<(String, String), AssetError> {
    let parts: Vec<&str> = object_key
        .trim_matches('/')
        .split('/')
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() < 3 {
        return Err(AssetError::Validation(
            "object_key must be in format: {category}/{entity_id}/{filename}".to_string(),
        ));
    }

    Ok((parts[0].to_string(), parts[1].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    use crate::storage::FakeStorageProvider;

    /// In-memory repository driven by the same merge rule as the SQL upsert
    #[derive(Default)]
    struct MemoryRepository {
        records: Mutex<Vec<AssetRecord>>,
        seq: AtomicI64,
    }

    #[async_trait]
    impl AssetRepository for MemoryRepository {
        async fn upsert_completed_upload(&self, upload: &NewAssetUpload) -> Result<(), DbError> {
            let mut records = self.records.lock().unwrap();
            if let Some(existing) = records
                .iter_mut()
                .find(|r| r.object_key == upload.object_key)
            {
                upload.merge_into(existing);
            } else {
                let seq = self.seq.fetch_add(1, Ordering::SeqCst);
                let created_at = Utc.timestamp_opt(seq, 0).unwrap();
                records.push(upload.clone().into_record(created_at));
            }
            Ok(())
        }

        async fn list_assets(
            &self,
            limit: i64,
            category: Option<&str>,
            entity_id: Option<&str>,
        ) -> Result<Vec<AssetRecord>, DbError> {
            let records = self.records.lock().unwrap();
            let mut matched: Vec<AssetRecord> = records
                .iter()
                .filter(|r| category.map_or(true, |c| r.category == c))
                .filter(|r| entity_id.map_or(true, |e| r.entity_id == e))
                .cloned()
                .collect();
            matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            matched.truncate(limit as usize);
            Ok(matched)
        }
    }

    fn service_without_repo() -> AssetService {
        AssetService::new(
            "http://cdn.example.com",
            Arc::new(FakeStorageProvider::new()),
            None,
        )
    }

    fn service_with_repo() -> (AssetService, Arc<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::default());
        let service = AssetService::new(
            "http://cdn.example.com",
            Arc::new(FakeStorageProvider::new()),
            Some(repo.clone()),
        );
        (service, repo)
    }

    fn completion(object_key: &str) -> CompleteUpload {
        CompleteUpload {
            object_key: object_key.to_string(),
            ..CompleteUpload::default()
        }
    }

    #[test]
    fn object_key_has_expected_shape() {
        let service = service_without_repo();
        let key = service
            .generate_object_key("avatars", "user-1", "face.png")
            .unwrap();

        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "avatars");
        assert_eq!(parts[1], "user-1");

        let token = parts[2].strip_suffix(".png").unwrap();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn object_keys_are_unique_for_identical_inputs() {
        let service = service_without_repo();
        let a = service
            .generate_object_key("avatars", "user-1", "face.png")
            .unwrap();
        let b = service
            .generate_object_key("avatars", "user-1", "face.png")
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn object_key_extension_handling() {
        let service = service_without_repo();

        let no_ext = service.generate_object_key("docs", "e1", "README").unwrap();
        assert!(!no_ext.rsplit('/').next().unwrap().contains('.'));

        let multi_dot = service
            .generate_object_key("docs", "e1", "bundle.tar.gz")
            .unwrap();
        assert!(multi_dot.ends_with(".gz"));

        let hidden = service.generate_object_key("docs", "e1", ".env").unwrap();
        assert!(!hidden.rsplit('/').next().unwrap().contains('.'));

        let trailing_dot = service.generate_object_key("docs", "e1", "face.").unwrap();
        assert!(!trailing_dot.rsplit('/').next().unwrap().contains('.'));
    }

    #[test]
    fn object_key_rejects_bad_segments() {
        let service = service_without_repo();

        assert!(matches!(
            service.generate_object_key("", "e1", "f.png"),
            Err(AssetError::Validation(_))
        ));
        assert!(matches!(
            service.generate_object_key("docs", "", "f.png"),
            Err(AssetError::Validation(_))
        ));
        assert!(matches!(
            service.generate_object_key("do/cs", "e1", "f.png"),
            Err(AssetError::Validation(_))
        ));
        assert!(matches!(
            service.generate_object_key("docs", "e1", ""),
            Err(AssetError::Validation(_))
        ));
    }

    #[test]
    fn asset_url_is_trailing_slash_insensitive() {
        let storage: Arc<dyn StorageProvider> = Arc::new(FakeStorageProvider::new());
        let with_slash = AssetService::new("http://x/", storage.clone(), None);
        let without_slash = AssetService::new("http://x", storage, None);

        assert_eq!(with_slash.build_asset_url("a/b/c"), "http://x/a/b/c");
        assert_eq!(without_slash.build_asset_url("a/b/c"), "http://x/a/b/c");
    }

    #[actix_rt::test]
    async fn complete_upload_requires_repository() {
        let service = service_without_repo();
        let err = service
            .complete_upload(completion("cat/ent/file.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::RepositoryNotConfigured));
    }

    #[actix_rt::test]
    async fn complete_upload_rejects_short_keys() {
        let (service, _) = service_with_repo();
        let err = service
            .complete_upload(completion("cat/file.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Validation(_)));
    }

    #[actix_rt::test]
    async fn complete_upload_validates_caller_supplied_fields() {
        let (service, _) = service_with_repo();

        let mut matching = completion("cat/ent/file.png");
        matching.category = Some("cat".to_string());
        matching.entity_id = Some("ent".to_string());
        assert!(service.complete_upload(matching).await.is_ok());

        let mut mismatched = completion("cat/ent/file.png");
        mismatched.category = Some("other".to_string());
        let err = service.complete_upload(mismatched).await.unwrap_err();
        assert!(matches!(err, AssetError::Validation(_)));

        let mut mismatched_entity = completion("cat/ent/file.png");
        mismatched_entity.entity_id = Some("other".to_string());
        let err = service.complete_upload(mismatched_entity).await.unwrap_err();
        assert!(matches!(err, AssetError::Validation(_)));
    }

    #[actix_rt::test]
    async fn complete_upload_defaults_filename_and_provider() {
        let (service, repo) = service_with_repo();
        service
            .complete_upload(completion("cat/ent/file.png"))
            .await
            .unwrap();

        let records = repo.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filename.as_deref(), Some("file.png"));
        assert_eq!(records[0].category, "cat");
        assert_eq!(records[0].entity_id, "ent");
        assert_eq!(records[0].upload_status, 0);
    }

    #[actix_rt::test]
    async fn resubmission_merges_instead_of_duplicating() {
        let (service, repo) = service_with_repo();

        let mut first = completion("cat/ent/file.png");
        first.file_size = Some(100);
        first.etag = Some("\"v1\"".to_string());
        service.complete_upload(first).await.unwrap();

        let mut second = completion("cat/ent/file.png");
        second.file_size = Some(200);
        service.complete_upload(second).await.unwrap();

        let records = repo.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_size, Some(200));
        assert_eq!(records[0].etag.as_deref(), Some("\"v1\""));
    }

    #[actix_rt::test]
    async fn list_assets_caps_and_orders_newest_first() {
        let (service, _) = service_with_repo();

        for i in 0..5 {
            service
                .complete_upload(completion(&format!("cat/ent/file-{}.png", i)))
                .await
                .unwrap();
        }

        let assets = service.list_assets(2, None, None).await.unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].object_key, "cat/ent/file-4.png");
        assert_eq!(assets[1].object_key, "cat/ent/file-3.png");
    }

    #[actix_rt::test]
    async fn list_assets_filters_by_category_and_entity() {
        let (service, _) = service_with_repo();

        service
            .complete_upload(completion("cat/ent/a.png"))
            .await
            .unwrap();
        service
            .complete_upload(completion("cat/other/b.png"))
            .await
            .unwrap();
        service
            .complete_upload(completion("docs/ent/c.pdf"))
            .await
            .unwrap();

        let cat_only = service.list_assets(10, Some("cat"), None).await.unwrap();
        assert_eq!(cat_only.len(), 2);

        let both = service
            .list_assets(10, Some("cat"), Some("ent"))
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].object_key, "cat/ent/a.png");
    }

    #[actix_rt::test]
    async fn upload_url_delegates_to_provider() {
        let service = service_without_repo();
        let url = service
            .generate_upload_url("cat/ent/k.png", "image/png", DEFAULT_UPLOAD_URL_TTL)
            .await
            .unwrap();
        assert!(url.contains("object_key=cat%2Fent%2Fk.png"));
        assert!(url.contains("expires=600"));
    }
}
