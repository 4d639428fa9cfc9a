use super::classifier::classify_file;
use super::key::new_object_key;
use super::remux::remux_for_fast_start;
use super::staging::{stage_upload, validate_media_type};
use super::{IngestError, IngestStage, OrientationCategory, StoredObjectReference, UploadedAsset};
use crate::config::IngestConfig;
use crate::entities::videos;
use crate::services::access_url::AccessUrlIssuer;
use crate::services::media_tool::MediaTool;
use crate::services::storage::{PresignedAccessUrl, StorageService};
use crate::services::video_repository::VideoRepository;
use aws_sdk_s3::primitives::ByteStream;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Result of a finalized ingestion
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub video: videos::Model,
    pub category: OrientationCategory,
    pub reference: StoredObjectReference,
    pub access_url: PresignedAccessUrl,
}

/// Runs one upload through stage → classify → remux → key → upload → record.
///
/// Every temporary file is owned by a guard local to `ingest_video`, so it is
/// removed on success, on any stage failure, and when the future is dropped.
/// Dropping the future also kills a running ffprobe/ffmpeg child.
pub struct IngestService {
    media: Arc<dyn MediaTool>,
    storage: Arc<dyn StorageService>,
    videos: Arc<dyn VideoRepository>,
    urls: Arc<AccessUrlIssuer>,
    config: IngestConfig,
}

impl IngestService {
    pub fn new(
        media: Arc<dyn MediaTool>,
        storage: Arc<dyn StorageService>,
        videos: Arc<dyn VideoRepository>,
        urls: Arc<AccessUrlIssuer>,
        config: IngestConfig,
    ) -> Self {
        Self {
            media,
            storage,
            videos,
            urls,
            config,
        }
    }

    pub async fn ingest_video<R>(
        &self,
        video_id: &str,
        upload: UploadedAsset<R>,
    ) -> Result<IngestOutcome, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        match self.run(video_id, upload).await {
            Ok(outcome) => {
                tracing::info!(
                    "✅ Ingested video {} as {} ({})",
                    video_id,
                    outcome.reference,
                    outcome.category.aspect_label()
                );
                Ok(outcome)
            }
            Err(e) if e.is_user_error() => {
                tracing::warn!(
                    "Ingestion of {} rejected at stage {}: {}",
                    video_id,
                    e.stage(),
                    e
                );
                Err(e)
            }
            Err(e) => {
                tracing::error!(
                    "❌ Ingestion of {} failed at stage {}: {}",
                    video_id,
                    e.stage(),
                    e
                );
                Err(e)
            }
        }
    }

    async fn run<R>(
        &self,
        video_id: &str,
        upload: UploadedAsset<R>,
    ) -> Result<IngestOutcome, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        // Rejections here happen before any file or process exists
        let media_type = validate_media_type(
            upload.content_type.as_deref(),
            &self.config.allowed_media_type,
        )?;

        self.videos
            .get_video(video_id)
            .await
            .map_err(|e| IngestError::Record(e.to_string()))?
            .ok_or_else(|| IngestError::VideoNotFound(video_id.to_string()))?;
        log_stage(video_id, IngestStage::Received);

        let staged = stage_upload(
            upload.reader,
            &self.config.temp_dir,
            self.config.max_upload_size,
        )
        .await?;
        log_stage(video_id, IngestStage::Staged);
        tracing::debug!("Staged {} bytes at {}", staged.size(), staged.path().display());

        let category = classify_file(self.media.as_ref(), staged.path()).await?;
        log_stage(video_id, IngestStage::Classified);

        let remuxed = remux_for_fast_start(self.media.as_ref(), staged.path()).await?;
        log_stage(video_id, IngestStage::Remuxed);

        let key = new_object_key(category)?;
        let reference = StoredObjectReference::new(self.storage.bucket(), key);
        log_stage(video_id, IngestStage::KeyAssigned);

        let body = ByteStream::from_path(&*remuxed)
            .await
            .map_err(|e| IngestError::Storage(format!("cannot read remuxed file: {}", e)))?;
        self.storage
            .put_object(
                &reference.bucket,
                &reference.key,
                media_type.essence_str(),
                body,
            )
            .await
            .map_err(|e| IngestError::Storage(e.to_string()))?;
        log_stage(video_id, IngestStage::Uploaded);

        // From here on the object exists; a failed record still fails the request
        let video = self
            .videos
            .set_video_reference(video_id, &reference)
            .await
            .map_err(|e| {
                tracing::warn!("Object {} stored but not recorded for {}", reference, video_id);
                IngestError::Record(e.to_string())
            })?;

        let access_url = self.urls.issue(&reference).await?;
        log_stage(video_id, IngestStage::Finalized);

        Ok(IngestOutcome {
            video,
            category,
            reference,
            access_url,
        })
    }
}

fn log_stage(video_id: &str, stage: IngestStage) {
    tracing::debug!("Video {} reached stage {}", video_id, stage);
}
