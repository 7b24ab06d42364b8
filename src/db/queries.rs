//! Database queries for asset metadata

use async_trait::async_trait;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;
use tracing::debug;

use super::models::{AssetRecord, NewAssetUpload};
use super::pool::{DbError, DbPool};

/// Persistence boundary consumed by the asset service.
///
/// Both operations surface a single `DbError` when the store is unreachable
/// or rejects the query; callers do not retry.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Insert-or-merge one completed upload, keyed on `object_key`.
    async fn upsert_completed_upload(&self, upload: &NewAssetUpload) -> Result<(), DbError>;

    /// List records newest first, optionally filtered by exact match.
    async fn list_assets(
        &self,
        limit: i64,
        category: Option<&str>,
        entity_id: Option<&str>,
    ) -> Result<Vec<AssetRecord>, DbError>;
}

/// PostgreSQL-backed repository over the shared pool
pub struct PgAssetRepository {
    pool: DbPool,
}

impl PgAssetRepository {
    pub fn new(pool: DbPool) -> Self {
        PgAssetRepository { pool }
    }

    fn record_from_row(row: &Row) -> AssetRecord {
        AssetRecord {
            object_key: row.get("object_key"),
            category: row.get("category"),
            entity_id: row.get("entity_id"),
            filename: row.get("filename"),
            content_type: row.get("content_type"),
            file_size: row.get("file_size"),
            etag: row.get("etag"),
            upload_status: row.get("upload_status"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl AssetRepository for PgAssetRepository {
    async fn upsert_completed_upload(&self, upload: &NewAssetUpload) -> Result<(), DbError> {
        let client = self.pool.get().await?;

        // COALESCE keeps stored metadata when the re-submission carries nulls;
        // created_at is set by the insert default and never updated.
        client
            .execute(
                r#"
                INSERT INTO assets (
                    object_key, category, entity_id, filename,
                    content_type, file_size, etag, storage_provider, upload_status
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (object_key) DO UPDATE SET
                    category = EXCLUDED.category,
                    entity_id = EXCLUDED.entity_id,
                    filename = COALESCE(EXCLUDED.filename, assets.filename),
                    content_type = COALESCE(EXCLUDED.content_type, assets.content_type),
                    file_size = COALESCE(EXCLUDED.file_size, assets.file_size),
                    etag = COALESCE(EXCLUDED.etag, assets.etag),
                    storage_provider = EXCLUDED.storage_provider,
                    upload_status = EXCLUDED.upload_status
                "#,
                &[
                    &upload.object_key,
                    &upload.category,
                    &upload.entity_id,
                    &upload.filename,
                    &upload.content_type,
                    &upload.file_size,
                    &upload.etag,
                    &upload.storage_provider,
                    &upload.upload_status,
                ],
            )
            .await?;

        debug!(object_key = %upload.object_key, "Upserted completed upload");
        Ok(())
    }

    async fn list_assets(
        &self,
        limit: i64,
        category: Option<&str>,
        entity_id: Option<&str>,
    ) -> Result<Vec<AssetRecord>, DbError> {
        let client = self.pool.get().await?;

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(category) = &category {
            params.push(category);
            clauses.push(format!("category = ${}", params.len()));
        }
        if let Some(entity_id) = &entity_id {
            params.push(entity_id);
            clauses.push(format!("entity_id = ${}", params.len()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        params.push(&limit);
        let sql = format!(
            r#"
            SELECT
                object_key, category, entity_id, filename,
                content_type, file_size, etag, upload_status, created_at
            FROM assets
            {}
            ORDER BY created_at DESC
            LIMIT ${}
            "#,
            where_sql,
            params.len()
        );

        let rows = client.query(&sql, &params).await?;
        Ok(rows.iter().map(Self::record_from_row).collect())
    }
}
