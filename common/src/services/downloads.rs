use super::ServiceError;
use crate::entities::{downloads, product_files};
use crate::repositories::downloads::{DownloadRepository, DownloadRequest};
use crate::repositories::products::ProductRepository;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
pub struct LedgerEntry {
    pub download: downloads::Model,
    /// False when the pair was already recorded. Not an error.
    pub created: bool,
}

#[async_trait]
pub trait DownloadService: Send + Sync {
    async fn record_if_absent(
        &self,
        user_id: i64,
        product_id: Uuid,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<LedgerEntry, ServiceError>;

    async fn main_file_for(&self, product_id: Uuid) -> Result<product_files::Model, ServiceError>;
}

pub struct DownloadServiceImpl {
    download_repo: Arc<dyn DownloadRepository>,
    product_repo: Arc<dyn ProductRepository>,
}

impl DownloadServiceImpl {
    pub fn new(
        download_repo: Arc<dyn DownloadRepository>,
        product_repo: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            download_repo,
            product_repo,
        }
    }
}

#[async_trait]
impl DownloadService for DownloadServiceImpl {
    async fn record_if_absent(
        &self,
        user_id: i64,
        product_id: Uuid,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<LedgerEntry, ServiceError> {
        let (download, created) = self
            .download_repo
            .record_if_absent(DownloadRequest {
                user_id,
                product_id,
                ip_address,
                user_agent,
            })
            .await?;

        if created {
            tracing::info!(%product_id, user_id, "Recorded first download");
        } else {
            tracing::debug!(%product_id, user_id, "Download already recorded");
        }

        Ok(LedgerEntry { download, created })
    }

    async fn main_file_for(&self, product_id: Uuid) -> Result<product_files::Model, ServiceError> {
        self.product_repo
            .main_file_for(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("main file of product {}", product_id)))
    }
}
