//! OpenAPI 3.0 specification definition

use utoipa::OpenApi;

use crate::api::handlers::{
    assets::{
        AssetListItem, CompleteUploadRequest, CompleteUploadResponse, ErrorResponse,
        ListAssetsResponse, UploadUrlRequest, UploadUrlResponse,
    },
    health::HealthResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Asset Gateway API",
        version = "0.1.0",
        description = "Presigned upload URL issuance and asset metadata bookkeeping",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "system", description = "System health endpoints"),
        (name = "assets", description = "Upload URL issuance and asset bookkeeping")
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::assets::generate_upload_url,
        crate::api::handlers::assets::complete_upload,
        crate::api::handlers::assets::list_assets,
    ),
    components(
        schemas(
            HealthResponse,
            UploadUrlRequest,
            UploadUrlResponse,
            CompleteUploadRequest,
            CompleteUploadResponse,
            ListAssetsResponse,
            AssetListItem,
            ErrorResponse,
        )
    )
)]
pub struct ApiDoc;
