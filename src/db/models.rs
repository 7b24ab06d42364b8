//! Database models for asset metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One completed upload as stored in the `assets` table
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssetRecord {
    pub object_key: String,
    pub category: String,
    pub entity_id: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub file_size: Option<i64>,
    pub etag: Option<String>,
    pub upload_status: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields written by a completion call.
///
/// Keyed on `object_key`; re-submissions merge rather than duplicate.
#[derive(Debug, Clone)]
pub struct NewAssetUpload {
    pub object_key: String,
    pub category: String,
    pub entity_id: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub file_size: Option<i64>,
    pub etag: Option<String>,
    pub storage_provider: String,
    pub upload_status: i32,
}

impl NewAssetUpload {
    /// Apply this upload onto an existing record.
    ///
    /// Mirrors the SQL upsert's conflict clause: non-null incoming metadata
    /// overwrites, null incoming metadata preserves the stored value, and
    /// `created_at` is never touched. Kept as a pure function so the merge
    /// semantics are testable without a live database.
    pub fn merge_into(&self, existing: &mut AssetRecord) {
        existing.category = self.category.clone();
        existing.entity_id = self.entity_id.clone();
        existing.upload_status = self.upload_status;

        if let Some(filename) = &self.filename {
            existing.filename = Some(filename.clone());
        }
        if let Some(content_type) = &self.content_type {
            existing.content_type = Some(content_type.clone());
        }
        if let Some(file_size) = self.file_size {
            existing.file_size = Some(file_size);
        }
        if let Some(etag) = &self.etag {
            existing.etag = Some(etag.clone());
        }
    }

    /// Materialize a fresh record for a first-time insert.
    pub fn into_record(self, created_at: DateTime<Utc>) -> AssetRecord {
        AssetRecord {
            object_key: self.object_key,
            category: self.category,
            entity_id: self.entity_id,
            filename: self.filename,
            content_type: self.content_type,
            file_size: self.file_size,
            etag: self.etag,
            upload_status: self.upload_status,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(object_key: &str) -> NewAssetUpload {
        NewAssetUpload {
            object_key: object_key.to_string(),
            category: "avatars".to_string(),
            entity_id: "user-1".to_string(),
            filename: Some("face.png".to_string()),
            content_type: Some("image/png".to_string()),
            file_size: Some(1024),
            etag: Some("\"abc123\"".to_string()),
            storage_provider: "fake".to_string(),
            upload_status: 0,
        }
    }

    #[test]
    fn merge_overwrites_with_non_null_values() {
        let first = upload("avatars/user-1/k.png");
        let mut record = first.into_record(Utc::now());

        let mut second = upload("avatars/user-1/k.png");
        second.file_size = Some(2048);
        second.merge_into(&mut record);

        assert_eq!(record.file_size, Some(2048));
    }

    #[test]
    fn merge_preserves_stored_values_for_null_fields() {
        let first = upload("avatars/user-1/k.png");
        let mut record = first.into_record(Utc::now());

        let mut second = upload("avatars/user-1/k.png");
        second.file_size = Some(2048);
        second.etag = None;
        second.content_type = None;
        second.merge_into(&mut record);

        assert_eq!(record.file_size, Some(2048));
        assert_eq!(record.etag.as_deref(), Some("\"abc123\""));
        assert_eq!(record.content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn merge_never_touches_created_at() {
        let created = Utc::now();
        let mut record = upload("avatars/user-1/k.png").into_record(created);

        upload("avatars/user-1/k.png").merge_into(&mut record);

        assert_eq!(record.created_at, created);
    }
}
