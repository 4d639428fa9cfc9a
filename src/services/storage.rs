use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

/// A time-limited GET URL for a stored object. Never persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PresignedAccessUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Bucket that receives new uploads
    fn bucket(&self) -> &str;

    /// Store `body` under `key` in a single put
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: ByteStream,
    ) -> Result<()>;

    /// Sign a GET request for `key` valid for `expires_in`
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<PresignedAccessUrl>;

    async fn file_exists(&self, bucket: &str, key: &str) -> Result<bool>;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: ByteStream,
    ) -> Result<()> {
        let res = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 put_object failed: {}/{}, error={}",
                bucket,
                key,
                DisplayErrorContext(&e)
            );
            return Err(anyhow!("put_object {}/{} failed: {}", bucket, key, DisplayErrorContext(&e)));
        }
        Ok(())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<PresignedAccessUrl> {
        let issued_at = Utc::now();
        let presigning = PresigningConfig::expires_in(expires_in)?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| anyhow!("presign {}/{} failed: {}", bucket, key, DisplayErrorContext(&e)))?;

        Ok(PresignedAccessUrl {
            url: request.uri().to_string(),
            expires_at: issued_at + chrono::Duration::from_std(expires_in)?,
        })
    }

    async fn file_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let res = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow!(service_error))
                }
            }
        }
    }
}
