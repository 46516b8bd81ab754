use super::ServiceError;
use crate::entities::assets::Bucket;
use crate::repositories::assets::{AssetRepository, NewAsset};
use crate::repositories::products::BlobRef;
use crate::storage::{compute_checksum, policy, BlobBackend};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use uuid::Uuid;

/// Retrieved payload plus the metadata needed to serve it.
#[derive(Debug, Clone)]
pub struct AssetContent {
    pub bytes: Bytes,
    pub content_type: String,
    pub filename: String,
    pub size: i64,
}

/// Reference and metadata of a freshly stored blob.
#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub id: Uuid,
    pub bucket: Bucket,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub checksum: String,
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Bytes,
    pub filename: String,
    pub content_type: String,
    /// Size as declared by the client. Must agree with `bytes.len()`.
    pub size: u64,
}

impl Upload {
    pub fn new(bytes: Bytes, filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        let size = bytes.len() as u64;
        Self {
            bytes,
            filename: filename.into(),
            content_type: content_type.into(),
            size,
        }
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        policy::validate_payload(&self.content_type, self.size, self.bytes.len())
    }
}

/// Removes blobs whose owning rows are already gone. Failures are logged and
/// leave an orphan behind.
pub(crate) async fn remove_orphans(assets: &dyn AssetService, blobs: &[BlobRef]) {
    for blob in blobs {
        if let Err(err) = assets.remove(blob.asset_id, blob.bucket).await {
            tracing::warn!(
                asset_id = %blob.asset_id,
                bucket = %blob.bucket,
                error = %err,
                "Failed to remove orphaned asset"
            );
        }
    }
}

#[async_trait]
pub trait AssetService: Send + Sync {
    async fn store(
        &self,
        upload: Upload,
        bucket: Bucket,
        checksum: Option<String>,
    ) -> Result<StoredAsset, ServiceError>;

    async fn retrieve(&self, id: Uuid, bucket: Bucket) -> Result<AssetContent, ServiceError>;

    /// Deletes the blob and its metadata row. Missing assets are ignored.
    async fn remove(&self, id: Uuid, bucket: Bucket) -> Result<(), ServiceError>;

    fn validate(&self, content_type: &str, size: u64) -> Result<(), ServiceError> {
        policy::validate(content_type, size)
    }
}

pub struct AssetServiceImpl {
    asset_repo: Arc<dyn AssetRepository>,
    backend: Arc<dyn BlobBackend>,
    compute_checksums: bool,
}

impl AssetServiceImpl {
    pub fn new(
        asset_repo: Arc<dyn AssetRepository>,
        backend: Arc<dyn BlobBackend>,
        compute_checksums: bool,
    ) -> Self {
        Self {
            asset_repo,
            backend,
            compute_checksums,
        }
    }
}

fn backend_error(err: anyhow::Error) -> ServiceError {
    ServiceError::StoreUnavailable(format!("blob backend: {}", err))
}

#[async_trait]
impl AssetService for AssetServiceImpl {
    async fn store(
        &self,
        upload: Upload,
        bucket: Bucket,
        checksum: Option<String>,
    ) -> Result<StoredAsset, ServiceError> {
        upload.validate()?;

        let id = Uuid::new_v4();
        let key = id.to_string();
        let content_type = policy::normalize_content_type(&upload.content_type);
        let checksum = match checksum {
            Some(checksum) => checksum,
            None if self.compute_checksums => compute_checksum(&upload.bytes),
            None => String::new(),
        };
        let size = upload.bytes.len() as i64;

        self.backend
            .put(bucket, &key, upload.bytes, &content_type)
            .await
            .map_err(backend_error)?;

        let row = self
            .asset_repo
            .insert(NewAsset {
                id,
                bucket,
                filename: upload.filename,
                content_type,
                size,
                checksum,
            })
            .await;

        let row = match row {
            Ok(row) => row,
            Err(err) => {
                if let Err(cleanup) = self.backend.delete(bucket, &key).await {
                    tracing::error!(asset_id = %id, %bucket, error = %cleanup, "Failed to delete orphaned blob");
                }
                return Err(err.into());
            }
        };

        tracing::info!(asset_id = %id, %bucket, size, "Stored asset");

        Ok(StoredAsset {
            id: row.id,
            bucket: row.bucket,
            filename: row.filename,
            content_type: row.content_type,
            size: row.size,
            checksum: row.checksum,
        })
    }

    async fn retrieve(&self, id: Uuid, bucket: Bucket) -> Result<AssetContent, ServiceError> {
        let meta = self
            .asset_repo
            .find(id, bucket)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("asset {} in {}", id, bucket)))?;

        let bytes = self
            .backend
            .get(bucket, &id.to_string())
            .await
            .map_err(backend_error)?
            .ok_or_else(|| ServiceError::not_found(format!("asset {} in {}", id, bucket)))?;

        Ok(AssetContent {
            bytes,
            content_type: meta.content_type,
            filename: meta.filename,
            size: meta.size,
        })
    }

    async fn remove(&self, id: Uuid, bucket: Bucket) -> Result<(), ServiceError> {
        self.backend
            .delete(bucket, &id.to_string())
            .await
            .map_err(backend_error)?;
        self.asset_repo.delete(id, bucket).await?;
        tracing::info!(asset_id = %id, %bucket, "Removed asset");
        Ok(())
    }
}
