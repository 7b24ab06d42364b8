//! Asset orchestration layer
//!
//! Sits between the HTTP handlers and the storage/database adapters: derives
//! object keys, delegates URL signing, and validates completion records.

mod service;

pub use service::{AssetError, AssetService, CompleteUpload, DEFAULT_UPLOAD_URL_TTL};
