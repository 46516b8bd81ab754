use super::BlobBackend;
use crate::entities::assets::Bucket;
use crate::settings::S3Settings;
use anyhow::Result;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_credential_types::{provider::SharedCredentialsProvider, Credentials};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;

const MULTIPART_THRESHOLD: usize = 5 * 1024 * 1024;
const UPLOAD_ATTEMPTS: u32 = 3;

/// All logical buckets share one S3 bucket and are told apart by key prefix.
pub struct S3BlobBackend {
    client: Client,
    bucket: String,
}

fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim_matches('"').trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn is_aliyun_oss(endpoint_url: &str) -> bool {
    endpoint_url.contains("aliyuncs.com")
}

fn resolve_force_path_style(force_path_style: bool, endpoint: Option<&str>) -> bool {
    if force_path_style {
        return true;
    }
    endpoint
        .map(normalize_endpoint)
        .is_some_and(|url| !is_aliyun_oss(&url))
}

/// HEAD has no body, so some stores only report the error code.
fn is_missing_object(err: &HeadObjectError) -> bool {
    matches!(err, HeadObjectError::NotFound(_))
        || matches!(err.code(), Some("NotFound" | "NoSuchKey"))
}

fn object_key(bucket: Bucket, key: &str) -> String {
    format!("{}/{}", bucket.as_str(), key.trim_start_matches('/'))
}

impl S3BlobBackend {
    pub async fn new(settings: &S3Settings) -> Self {
        let region_provider =
            RegionProviderChain::first_try(aws_types::region::Region::new(settings.region.clone()))
                .or_default_provider();

        let mut config_loader =
            aws_config::defaults(BehaviorVersion::latest()).region(region_provider);

        if let (Some(ak), Some(sk)) = (
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
        ) {
            let creds = Credentials::new(ak, sk, None, None, "config");
            config_loader =
                config_loader.credentials_provider(SharedCredentialsProvider::new(creds));
        }

        if let Some(ep) = settings.endpoint.as_deref() {
            config_loader = config_loader.endpoint_url(normalize_endpoint(ep));
        }

        let config = config_loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(resolve_force_path_style(
                settings.force_path_style,
                settings.endpoint.as_deref(),
            ))
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: settings.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Creates the backing bucket. An existing bucket is not an error.
    pub async fn ensure_bucket(&self) -> Result<()> {
        match self.client.create_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                tracing::info!(bucket = %self.bucket, "Bucket created");
                Ok(())
            }
            Err(err) => {
                let message = format!("{:?}", err);
                if message.contains("BucketAlreadyOwnedByYou")
                    || message.contains("BucketAlreadyExists")
                {
                    tracing::info!(bucket = %self.bucket, "Bucket already exists");
                    Ok(())
                } else {
                    Err(err.into())
                }
            }
        }
    }

    /// Cheap round trip used to wait for the object store to come up.
    pub async fn ping(&self) -> Result<()> {
        self.client.list_buckets().send().await?;
        Ok(())
    }

    async fn upload_once(&self, key: &str, body: &Bytes, content_type: &str) -> Result<()> {
        if body.len() > MULTIPART_THRESHOLD {
            return self.upload_multipart(key, body, content_type).await;
        }

        let md5_digest = md5::compute(body);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_md5(general_purpose::STANDARD.encode(md5_digest.0))
            .body(ByteStream::from(body.clone()))
            .send()
            .await?;
        Ok(())
    }

    async fn upload_multipart(&self, key: &str, body: &Bytes, content_type: &str) -> Result<()> {
        let upload_id = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await?
            .upload_id
            .ok_or_else(|| anyhow::anyhow!("No upload ID"))?;

        let mut completed_parts = Vec::new();
        for (i, chunk) in body.chunks(MULTIPART_THRESHOLD).enumerate() {
            let part_number = (i + 1) as i32;
            let part = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(&upload_id)
                .part_number(part_number)
                .body(ByteStream::from(Bytes::copy_from_slice(chunk)))
                .send()
                .await;

            let part = match part {
                Ok(part) => part,
                Err(err) => {
                    let _ = self
                        .client
                        .abort_multipart_upload()
                        .bucket(&self.bucket)
                        .key(key)
                        .upload_id(&upload_id)
                        .send()
                        .await;
                    return Err(err.into());
                }
            };

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(part.e_tag.unwrap_or_default())
                    .part_number(part_number)
                    .build(),
            );
        }

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(&upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed_parts))
                    .build(),
            )
            .send()
            .await?;

        Ok(())
    }
}

#[async_trait]
impl BlobBackend for S3BlobBackend {
    async fn put(&self, bucket: Bucket, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        let key = object_key(bucket, key);

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.upload_once(&key, &data, content_type).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if attempts >= UPLOAD_ATTEMPTS {
                        return Err(e);
                    }
                    tracing::warn!(attempt = attempts, key = %key, error = ?e, "Upload failed, retrying");
                    tokio::time::sleep(std::time::Duration::from_millis(500 * attempts as u64))
                        .await;
                }
            }
        }
    }

    async fn get(&self, bucket: Bucket, key: &str) -> Result<Option<Bytes>> {
        let key = object_key(bucket, key);
        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(obj) => Ok(Some(obj.body.collect().await?.into_bytes())),
            Err(err) => match err.as_service_error() {
                Some(GetObjectError::NoSuchKey(_)) => Ok(None),
                _ => Err(err.into()),
            },
        }
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> Result<bool> {
        let key = object_key(bucket, key);
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;
        if let Err(err) = head {
            return match err.as_service_error() {
                Some(service_err) if is_missing_object(service_err) => Ok(false),
                _ => Err(err.into()),
            };
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_helpers_normalize_values() {
        assert_eq!(
            normalize_endpoint("s3.example.com"),
            "https://s3.example.com"
        );
        assert_eq!(
            normalize_endpoint("\"http://localhost:9000\""),
            "http://localhost:9000"
        );
    }

    #[test]
    fn force_path_style_follows_aliyun_rules() {
        assert!(!resolve_force_path_style(
            false,
            Some("https://oss-cn-shanghai.aliyuncs.com")
        ));
        assert!(resolve_force_path_style(false, Some("minio.local:9000")));
        assert!(resolve_force_path_style(true, None));
        assert!(!resolve_force_path_style(false, None));
    }

    #[test]
    fn missing_objects_are_recognised_from_head_errors() {
        use aws_sdk_s3::error::ErrorMetadata;
        use aws_sdk_s3::types::error::NotFound;

        assert!(is_missing_object(&HeadObjectError::NotFound(
            NotFound::builder().build()
        )));
        assert!(is_missing_object(&HeadObjectError::generic(
            ErrorMetadata::builder().code("NoSuchKey").build()
        )));
        assert!(!is_missing_object(&HeadObjectError::generic(
            ErrorMetadata::builder().code("AccessDenied").build()
        )));
    }

    #[test]
    fn object_keys_are_prefixed_by_bucket() {
        assert_eq!(object_key(Bucket::Thumbnails, "abc"), "thumbnails/abc");
        assert_eq!(object_key(Bucket::License, "/abc"), "license/abc");
    }
}
