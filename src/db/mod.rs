//! Database module for PostgreSQL connectivity
//!
//! Provides connection pool management and the asset metadata repository.

pub mod models;
pub mod pool;
pub mod queries;

pub use models::{AssetRecord, NewAssetUpload};
pub use pool::{DbError, DbPool};
pub use queries::{AssetRepository, PgAssetRepository};
