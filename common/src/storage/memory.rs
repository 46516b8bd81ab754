//! In-memory blob backend.
//!
//! Non-persistent, backed by `DashMap` for concurrent access. Used for local
//! development and tests.

use super::BlobBackend;
use crate::entities::assets::Bucket;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

#[derive(Clone, Default)]
pub struct MemoryBlobBackend {
    data: DashMap<(Bucket, String), Bytes>,
}

impl MemoryBlobBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl BlobBackend for MemoryBlobBackend {
    async fn put(&self, bucket: Bucket, key: &str, data: Bytes, _content_type: &str) -> Result<()> {
        self.data.insert((bucket, key.to_string()), data);
        Ok(())
    }

    async fn get(&self, bucket: Bucket, key: &str) -> Result<Option<Bytes>> {
        Ok(self
            .data
            .get(&(bucket, key.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> Result<bool> {
        Ok(self.data.remove(&(bucket, key.to_string())).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn buckets_are_separate_namespaces() {
        let backend = MemoryBlobBackend::new();
        backend
            .put(Bucket::Products, "a", Bytes::from_static(b"zip"), "application/zip")
            .await
            .unwrap();

        assert_eq!(
            backend.get(Bucket::Products, "a").await.unwrap(),
            Some(Bytes::from_static(b"zip"))
        );
        assert_eq!(backend.get(Bucket::Thumbnails, "a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_reports_whether_object_existed() {
        let backend = MemoryBlobBackend::new();
        backend
            .put(Bucket::Avatars, "me", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();

        assert!(backend.delete(Bucket::Avatars, "me").await.unwrap());
        assert!(!backend.delete(Bucket::Avatars, "me").await.unwrap());
        assert!(backend.is_empty());
    }
}
