//! Blob persistence behind the asset store.
//!
//! Backends only move bytes. Validation and metadata rows live in
//! `services::assets`.

pub mod memory;
pub mod policy;
pub mod s3;

use crate::entities::assets::Bucket;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

pub use memory::MemoryBlobBackend;
pub use s3::S3BlobBackend;

/// Object store addressed by `(bucket, key)`. Buckets are independent
/// namespaces: the same key in two buckets names two different objects.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    async fn put(&self, bucket: Bucket, key: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// `Ok(None)` when the object does not exist.
    async fn get(&self, bucket: Bucket, key: &str) -> Result<Option<Bytes>>;

    /// Returns whether an object was removed. Deleting a missing key is not
    /// an error.
    async fn delete(&self, bucket: Bucket, key: &str) -> Result<bool>;
}

/// Lowercase hex MD5 of the payload.
pub fn compute_checksum(data: &[u8]) -> String {
    hex::encode(md5::compute(data).0)
}

#[cfg(test)]
mod tests {
    use super::compute_checksum;

    #[test]
    fn checksum_is_md5_hex() {
        assert_eq!(compute_checksum(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            compute_checksum(b"hello"),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }
}
