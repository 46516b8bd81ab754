pub mod admin;
pub mod assets;
pub mod categories;
pub mod developers;
pub mod moderation;
pub mod products;
pub mod reviews;

use crate::error::ApiError;
use axum::extract::multipart::Field;
use bytes::Bytes;
use common::services::assets::Upload;

/// Reads a multipart file part into an upload. The part's declared content
/// type is used as is; policy checks happen in the asset store.
pub(crate) async fn read_upload(field: Field<'_>) -> Result<Upload, ApiError> {
    let filename = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| "upload".to_string());
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let bytes: Bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid file: {}", e)))?;
    Ok(Upload::new(bytes, filename, content_type))
}

pub(crate) async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid field: {}", e)))
}

/// Comma separated form values, also accepted as repeated fields.
pub(crate) fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
