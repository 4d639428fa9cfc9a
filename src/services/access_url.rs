use crate::entities::videos;
use crate::services::ingest::{IngestError, StoredObjectReference};
use crate::services::storage::{PresignedAccessUrl, StorageService};
use std::sync::Arc;
use std::time::Duration;

/// Turns stored references into short-lived GET URLs.
///
/// URLs are derived on every read and never written back.
pub struct AccessUrlIssuer {
    storage: Arc<dyn StorageService>,
    expiry: Duration,
}

impl AccessUrlIssuer {
    pub fn new(storage: Arc<dyn StorageService>, expiry: Duration) -> Self {
        Self { storage, expiry }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub async fn issue(
        &self,
        reference: &StoredObjectReference,
    ) -> Result<PresignedAccessUrl, IngestError> {
        self.issue_for(reference, self.expiry).await
    }

    pub async fn issue_for(
        &self,
        reference: &StoredObjectReference,
        expires_in: Duration,
    ) -> Result<PresignedAccessUrl, IngestError> {
        self.storage
            .presign_get(&reference.bucket, &reference.key, expires_in)
            .await
            .map_err(|e| {
                tracing::error!("Failed to presign {}: {}", reference, e);
                IngestError::Signing(e.to_string())
            })
    }

    /// Sign a legacy `"<bucket>,<key>"` value. `None` means nothing was uploaded.
    pub async fn issue_for_composite(
        &self,
        composite: Option<&str>,
    ) -> Result<Option<PresignedAccessUrl>, IngestError> {
        let Some(composite) = composite else {
            return Ok(None);
        };
        let reference = StoredObjectReference::parse_composite(composite)?;
        self.issue(&reference).await.map(Some)
    }

    /// Sign the object behind a video record, or `None` when it has no video yet.
    pub async fn sign_video(
        &self,
        video: &videos::Model,
    ) -> Result<Option<PresignedAccessUrl>, IngestError> {
        match video.stored_reference()? {
            Some(reference) => self.issue(&reference).await.map(Some),
            None => Ok(None),
        }
    }
}
