//! Asset endpoints: upload-url issuance, completion, listing

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::asset::{AssetError, CompleteUpload, DEFAULT_UPLOAD_URL_TTL};
use crate::db::AssetRecord;
use crate::AppState;

const DEFAULT_LIST_LIMIT: i64 = 20;

/// Request to issue a presigned upload URL
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadUrlRequest {
    pub category: String,
    pub entity_id: String,
    pub filename: String,
    pub content_type: String,
}

/// Response carrying the derived key and both URLs
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadUrlResponse {
    pub object_key: String,
    pub upload_url: String,
    pub asset_url: String,
}

/// Request acknowledging a finished upload
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteUploadRequest {
    pub object_key: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub etag: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteUploadResponse {
    pub object_key: String,
    pub asset_url: String,
    pub status: &'static str,
}

/// Query parameters for listing assets
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAssetsQuery {
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub entity_id: Option<String>,
}

/// One asset record plus its derived public URL
#[derive(Debug, Serialize, ToSchema)]
pub struct AssetListItem {
    pub object_key: String,
    pub category: String,
    pub entity_id: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub file_size: Option<i64>,
    pub etag: Option<String>,
    pub upload_status: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub asset_url: String,
}

impl AssetListItem {
    fn new(record: AssetRecord, asset_url: String) -> Self {
        AssetListItem {
            object_key: record.object_key,
            category: record.category,
            entity_id: record.entity_id,
            filename: record.filename,
            content_type: record.content_type,
            file_size: record.file_size,
            etag: record.etag,
            upload_status: record.upload_status,
            created_at: record.created_at,
            asset_url,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListAssetsResponse {
    pub items: Vec<AssetListItem>,
}

/// Error body shared by all asset endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "validation_error",
        message: message.into(),
    })
}

fn error_response(err: AssetError) -> HttpResponse {
    match err {
        AssetError::Validation(message) => bad_request(message),
        AssetError::RepositoryNotConfigured => {
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "persistence_unavailable",
                message: err.to_string(),
            })
        }
        AssetError::Repository(e) => {
            error!(error = %e, "Repository operation failed");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "persistence_error",
                message: e.to_string(),
            })
        }
        AssetError::Storage(e) => {
            error!(error = %e, "Storage provider failed");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "storage_error",
                message: e.to_string(),
            })
        }
    }
}

/// POST /assets/upload-url - Derive an object key and presign an upload URL
#[utoipa::path(
    post,
    path = "/assets/upload-url",
    tag = "assets",
    request_body = UploadUrlRequest,
    responses(
        (status = 200, description = "Presigned upload URL issued", body = UploadUrlResponse),
        (status = 400, description = "Invalid request fields", body = ErrorResponse),
        (status = 500, description = "Provider signing failure", body = ErrorResponse)
    )
)]
pub async fn generate_upload_url(
    state: web::Data<AppState>,
    body: web::Json<UploadUrlRequest>,
) -> HttpResponse {
    if body.content_type.is_empty() {
        return bad_request("content_type must not be empty");
    }

    let service = &state.asset_service;

    let object_key =
        match service.generate_object_key(&body.category, &body.entity_id, &body.filename) {
            Ok(key) => key,
            Err(e) => return error_response(e),
        };

    let upload_url = match service
        .generate_upload_url(&object_key, &body.content_type, DEFAULT_UPLOAD_URL_TTL)
        .await
    {
        Ok(url) => url,
        Err(e) => return error_response(e),
    };

    let asset_url = service.build_asset_url(&object_key);

    HttpResponse::Ok().json(UploadUrlResponse {
        object_key,
        upload_url,
        asset_url,
    })
}

/// POST /assets/complete-upload - Record a finished upload
#[utoipa::path(
    post,
    path = "/assets/complete-upload",
    tag = "assets",
    request_body = CompleteUploadRequest,
    responses(
        (status = 200, description = "Upload acknowledged", body = CompleteUploadResponse),
        (status = 400, description = "Malformed object key or mismatched fields", body = ErrorResponse),
        (status = 503, description = "Persistence not configured", body = ErrorResponse),
        (status = 500, description = "Persistence failure", body = ErrorResponse)
    )
)]
pub async fn complete_upload(
    state: web::Data<AppState>,
    body: web::Json<CompleteUploadRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    let object_key = body.object_key.trim().trim_start_matches('/').to_string();
    if object_key.is_empty() {
        return bad_request("object_key is required");
    }

    let request = CompleteUpload {
        object_key: object_key.clone(),
        category: body.category,
        entity_id: body.entity_id,
        filename: body.filename,
        content_type: body.content_type,
        file_size: body.file_size,
        etag: body.etag,
    };

    if let Err(e) = state.asset_service.complete_upload(request).await {
        return error_response(e);
    }

    let asset_url = state.asset_service.build_asset_url(&object_key);

    HttpResponse::Ok().json(CompleteUploadResponse {
        object_key,
        asset_url,
        status: "acknowledged",
    })
}

/// GET /assets - List completed uploads, newest first
#[utoipa::path(
    get,
    path = "/assets",
    tag = "assets",
    params(ListAssetsQuery),
    responses(
        (status = 200, description = "Completed uploads", body = ListAssetsResponse),
        (status = 503, description = "Persistence not configured", body = ErrorResponse),
        (status = 500, description = "Persistence failure", body = ErrorResponse)
    )
)]
pub async fn list_assets(
    state: web::Data<AppState>,
    query: web::Query<ListAssetsQuery>,
) -> HttpResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit < 1 {
        return bad_request("limit must be positive");
    }

    let records = match state
        .asset_service
        .list_assets(limit, query.category.as_deref(), query.entity_id.as_deref())
        .await
    {
        Ok(records) => records,
        Err(e) => return error_response(e),
    };

    let items = records
        .into_iter()
        .map(|record| {
            let asset_url = state.asset_service.build_asset_url(&record.object_key);
            AssetListItem::new(record, asset_url)
        })
        .collect();

    HttpResponse::Ok().json(ListAssetsResponse { items })
}
